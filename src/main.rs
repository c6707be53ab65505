//! Synapse - command-line front-end for the learning platform client core
//!
//! Signs in, chats with the study assistant, manages the theme preference
//! and previews page tours, all through the same client core the apps use.
//!
//! ## Usage
//!
//! ```bash
//! # Sign in (prompts for the password when --password is omitted)
//! synapse login ada@example.com
//!
//! # Start a new chat, then continue it
//! synapse chat send "Explain photosynthesis"
//! synapse chat send --chat c42 "Now quiz me on it"
//!
//! # Preview a page tour on a sample layout
//! synapse tour preview tours.yaml dashboard --element "#courses=300,120,400,200"
//!
//! # With verbose logging and a custom config file
//! synapse -v --config ./synapse.yaml whoami
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use synapse_client::{ApiClient, AuthApi, ChatSession, DeepLink, HttpChatService};
use synapse_config::SynapseConfig;
use synapse_core::{
    AuthModalState, ChatMessage, EventBus, FileStore, KeyValueStore, LogGuard, ThemeContext,
    ThemePreference, ToastCenter, TokenStore, init_logging,
};
use synapse_tour::{Rect, StaticPage, TourOverlay, TourRegistry, Viewport};
use tracing::{error, info};

/// Synapse learning platform client
#[derive(Parser, Debug)]
#[command(name = "synapse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.synapse/logs/)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.synapse/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    Login {
        email: String,
        /// Password; read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Talk to the study assistant
    #[command(subcommand)]
    Chat(ChatCommand),
    /// Light, dark or system appearance
    #[command(subcommand)]
    Theme(ThemeCommand),
    /// Inspect and preview page tours
    #[command(subcommand)]
    Tour(TourCommand),
    /// Apply an auth callback link (synapse://auth/callback?...)
    Deeplink { uri: String },
}

#[derive(Subcommand, Debug)]
enum ChatCommand {
    /// Send a message, creating a chat unless --chat is given
    Send {
        #[arg(long)]
        chat: Option<String>,
        message: String,
    },
    /// Print a chat transcript
    Show { chat: String },
    /// Replace a message and print the resulting transcript
    Edit {
        chat: String,
        index: usize,
        content: String,
    },
    /// Regenerate a response and print the resulting transcript
    Regenerate { chat: String, index: usize },
    /// List chats
    List,
    /// Delete a chat
    Delete { chat: String },
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    /// Print the stored preference and what it resolves to
    Show {
        /// Resolve `system` as if the OS were in dark mode
        #[arg(long)]
        system_dark: bool,
    },
    /// Store a preference: light, dark or system
    Set { preference: String },
    /// Move to the next preference
    Cycle,
}

#[derive(Subcommand, Debug)]
enum TourCommand {
    /// List the pages a tour file covers
    List { file: PathBuf },
    /// Walk a tour on a sample layout and print where each tip lands
    Preview {
        file: PathBuf,
        page: String,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
        /// Element box as SELECTOR=LEFT,TOP,WIDTH,HEIGHT (document coordinates)
        #[arg(long = "element", value_parser = parse_element)]
        elements: Vec<(String, Rect)>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match SynapseConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(hint) = e.guidance() {
                eprintln!("{hint}");
            }
            return ExitCode::from(2);
        }
    };

    // Initialize logging
    let _guard = match setup_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::from(1);
        }
    };

    info!(base_url = %config.api.base_url, "starting synapse");

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("synapse error: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Set up logging based on CLI arguments and config.
fn setup_logging(cli: &Cli, config: &SynapseConfig) -> synapse_core::Result<LogGuard> {
    let log_dir = cli.log_dir.clone().or_else(|| config.log_dir.clone());
    init_logging(log_dir, cli.verbose > 0)
}

/// Everything a command needs, wired the way the apps wire it.
struct App {
    store: Arc<dyn KeyValueStore>,
    client: Arc<ApiClient>,
    toasts: Arc<ToastCenter>,
    modal: Arc<AuthModalState>,
}

impl App {
    fn new(config: &SynapseConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage_path()?));
        let bus = Arc::new(EventBus::new());
        let toasts = ToastCenter::attach(&bus);
        let modal = AuthModalState::attach(&bus);
        let client = ApiClient::from_config(config, TokenStore::new(store.clone()), bus)?;

        Ok(Self {
            store,
            client: Arc::new(client),
            toasts,
            modal,
        })
    }

    fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    fn chat(&self) -> ChatSession {
        ChatSession::new(Arc::new(HttpChatService::new(self.client.clone())))
    }

    /// Print what the UI would have shown as toasts or modals.
    fn flush_notifications(&self) {
        for toast in self.toasts.active() {
            eprintln!("[{}] {}", toast.severity, toast.message);
            self.toasts.dismiss(toast.id);
        }
        if self.modal.take_request() {
            eprintln!("Run `synapse login <email>` to sign in again.");
        }
    }
}

async fn run(command: Command, config: SynapseConfig) -> Result<()> {
    let app = App::new(&config)?;
    let result = dispatch(&app, command).await;
    app.flush_notifications();
    result
}

async fn dispatch(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let user = app.auth().login(&email, &password).await?;
            match user {
                Some(user) => println!("Signed in as {}", user.name.unwrap_or(user.email)),
                None => println!("Signed in"),
            }
        }
        Command::Logout => {
            app.auth().logout().await?;
            println!("Signed out");
        }
        Command::Whoami => {
            let auth = app.auth();
            if !auth.is_signed_in() {
                println!("Not signed in");
                return Ok(());
            }
            let user = auth.current_user().await?;
            match user.name {
                Some(name) => println!("{name} <{}>", user.email),
                None => println!("{}", user.email),
            }
        }
        Command::Chat(command) => chat(app, command).await?,
        Command::Theme(command) => theme(app, command)?,
        Command::Tour(command) => tour(command)?,
        Command::Deeplink { uri } => {
            let link = DeepLink::parse(&uri)?;
            if app.auth().apply_deep_link(&link)? {
                println!("Signed in from link");
            } else if let DeepLink::Status { status, message } = &link {
                let message = message.as_deref().unwrap_or("no details");
                if link.is_error() {
                    bail!("sign-in failed: {message}");
                }
                println!("{status}: {message}");
            }
        }
    }
    Ok(())
}

async fn chat(app: &App, command: ChatCommand) -> Result<()> {
    let session = app.chat();
    match command {
        ChatCommand::Send { chat, message } => {
            if let Some(id) = chat {
                session.open_chat(&id).await?;
            }
            let reply = session.send_message(&message).await?;
            print_message(session.messages().len() - 1, &reply);
            if let Some(id) = session.chat_id() {
                eprintln!("chat: {id}");
            }
        }
        ChatCommand::Show { chat } => {
            session.open_chat(&chat).await?;
            if let Some(title) = session.title() {
                println!("# {title}");
            }
            print_transcript(&session.messages());
        }
        ChatCommand::Edit {
            chat,
            index,
            content,
        } => {
            session.open_chat(&chat).await?;
            print_transcript(&session.edit_message(index, &content).await?);
        }
        ChatCommand::Regenerate { chat, index } => {
            session.open_chat(&chat).await?;
            print_transcript(&session.regenerate_response(index).await?);
        }
        ChatCommand::List => {
            for summary in session.list_chats().await? {
                println!(
                    "{}\t{}",
                    summary.id,
                    summary.title.as_deref().unwrap_or("(untitled)")
                );
            }
        }
        ChatCommand::Delete { chat } => {
            session.delete_chat(&chat).await?;
            println!("Deleted {chat}");
        }
    }
    Ok(())
}

fn theme(app: &App, command: ThemeCommand) -> Result<()> {
    let system_dark = matches!(command, ThemeCommand::Show { system_dark: true });
    let mut theme = ThemeContext::load(app.store.clone(), system_dark)?;
    match command {
        ThemeCommand::Show { .. } => {
            println!("{} ({})", theme.preference(), theme.resolved());
        }
        ThemeCommand::Set { preference } => {
            let preference: ThemePreference = preference.parse()?;
            theme.set_preference(preference)?;
            println!("Theme set to {preference}");
        }
        ThemeCommand::Cycle => {
            println!("Theme set to {}", theme.cycle()?);
        }
    }
    Ok(())
}

fn tour(command: TourCommand) -> Result<()> {
    match command {
        TourCommand::List { file } => {
            let registry = TourRegistry::from_file(&file)?;
            for page_id in registry.page_ids() {
                let config = registry.get(page_id)?;
                println!("{page_id}\t{} ({} steps)", config.title, config.steps.len());
            }
        }
        TourCommand::Preview {
            file,
            page,
            width,
            height,
            elements,
        } => {
            let registry = TourRegistry::from_file(&file)?;
            let config = registry.get(&page)?.clone();

            let layout = elements
                .into_iter()
                .fold(StaticPage::new(Viewport::new(width, height)), |layout, (selector, rect)| {
                    layout.with_element(selector, rect)
                });
            let mut overlay = TourOverlay::new(layout);
            if !overlay.start(config) {
                bail!("tour for '{page}' has no steps");
            }

            while let Some(step) = overlay.walker().current_step() {
                let number = overlay.walker().current_index().unwrap_or_default() + 1;
                match overlay.position() {
                    Some(p) => println!("{number}. {} at ({:.0}, {:.0})", step.title, p.x, p.y),
                    None => println!("{number}. {} (target not on page)", step.title),
                }
                overlay.advance();
            }
        }
    }
    Ok(())
}

fn print_message(index: usize, message: &ChatMessage) {
    println!("[{index}] {}: {}", message.role, message.content);
    for attachment in &message.attachments {
        println!("      + {:?} attachment", attachment.kind);
    }
}

fn print_transcript(messages: &[ChatMessage]) {
    for (index, message) in messages.iter().enumerate() {
        print_message(index, message);
    }
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Parse `SELECTOR=LEFT,TOP,WIDTH,HEIGHT`.
fn parse_element(s: &str) -> std::result::Result<(String, Rect), String> {
    let (selector, dims) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected SELECTOR=LEFT,TOP,WIDTH,HEIGHT, got '{s}'"))?;
    let values = dims
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("bad number '{v}': {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [left, top, width, height] => Ok((
            selector.trim().to_string(),
            Rect::new(*left, *top, *width, *height),
        )),
        _ => Err(format!("expected 4 numbers after '=', got {}", values.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_element() {
        let (selector, rect) = parse_element("#courses=300,120,400,200").unwrap();
        assert_eq!(selector, "#courses");
        assert_eq!(rect, Rect::new(300.0, 120.0, 400.0, 200.0));

        // Attribute selectors may contain '='
        let (selector, _) = parse_element("[data-tour=nav]=0,0,10,10").unwrap();
        assert_eq!(selector, "[data-tour=nav]");

        assert!(parse_element("#a=1,2,3").is_err());
        assert!(parse_element("#a").is_err());
    }

    #[test]
    fn test_cli_parses_chat_send() {
        let cli = Cli::try_parse_from(["synapse", "-v", "chat", "send", "--chat", "c1", "hi"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Command::Chat(ChatCommand::Send { chat: Some(ref c), ref message }) if c == "c1" && message == "hi"
        ));
    }
}
