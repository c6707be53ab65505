//! Chat session state.
//!
//! [`ChatSession`] owns the transcript of the open chat and serializes the
//! operations that mutate it. Sending is optimistic: the user's message is
//! shown immediately through a [`PendingAppend`] and either committed
//! together with the reply or reverted when the call fails.
//!
//! Switching chats bumps a generation counter. Any in-flight result that was
//! started under an older generation is returned to its caller but never
//! applied to the transcript now on screen.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use synapse_core::ChatMessage;
use tracing::{debug, info, warn};

use crate::chat::{ChatService, ChatSummary};
use crate::error::{ChatError, Result};

/// Handle to a tentatively appended message.
///
/// Must be passed back to [`Transcript::commit`] or [`Transcript::revert`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending append must be committed or reverted"]
pub struct PendingAppend {
    index: usize,
    epoch: u64,
}

impl PendingAppend {
    /// Position of the tentative message.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Ordered, index-addressable list of chat messages.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    pending: Option<usize>,
    epoch: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Show `message` right away, pending confirmation.
    pub fn begin_append(&mut self, message: ChatMessage) -> PendingAppend {
        let index = self.messages.len();
        self.messages.push(message);
        self.pending = Some(index);
        PendingAppend {
            index,
            epoch: self.epoch,
        }
    }

    /// Keep the pending message and append `reply` after it.
    ///
    /// Returns false when the transcript was replaced since the append began.
    pub fn commit(&mut self, pending: PendingAppend, reply: ChatMessage) -> bool {
        if !self.owns(&pending) {
            return false;
        }
        self.pending = None;
        self.messages.push(reply);
        true
    }

    /// Drop the pending message and everything after it.
    ///
    /// Returns false when the transcript was replaced since the append began.
    pub fn revert(&mut self, pending: PendingAppend) -> bool {
        if !self.owns(&pending) {
            return false;
        }
        self.pending = None;
        self.messages.truncate(pending.index);
        true
    }

    /// Replace the whole transcript. Outstanding pending appends go stale.
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
        self.pending = None;
        self.epoch += 1;
    }

    fn owns(&self, pending: &PendingAppend) -> bool {
        pending.epoch == self.epoch && self.pending == Some(pending.index)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    chat_id: Option<String>,
    title: Option<String>,
    transcript: Transcript,
    generation: u64,
}

impl SessionState {
    /// Start over on a different chat (or none).
    fn switch_to(&mut self, chat_id: Option<String>, title: Option<String>, messages: Vec<ChatMessage>) {
        self.generation += 1;
        self.chat_id = chat_id;
        self.title = title;
        self.transcript.replace(messages);
    }
}

/// Clears the busy flag on drop.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| ChatError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Client-side state of one chat conversation.
pub struct ChatSession {
    service: Arc<dyn ChatService>,
    state: Mutex<SessionState>,
    busy: AtomicBool,
    open_requests: AtomicU64,
}

impl ChatSession {
    /// Create a session with no chat open.
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self {
            service,
            state: Mutex::new(SessionState::default()),
            busy: AtomicBool::new(false),
            open_requests: AtomicU64::new(0),
        }
    }

    /// Send a user message and return the assistant's reply.
    ///
    /// The remote chat is created on the first send of an unsaved session.
    pub async fn send_message(&self, content: &str) -> Result<ChatMessage> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let _busy = BusyGuard::acquire(&self.busy)?;

        let (pending, chat_id, generation) = {
            let mut state = self.lock();
            let pending = state.transcript.begin_append(ChatMessage::user(content));
            (pending, state.chat_id.clone(), state.generation)
        };

        let chat_id = match chat_id {
            Some(id) => id,
            None => match self.service.create_chat().await {
                Ok(summary) => {
                    let mut state = self.lock();
                    if state.generation == generation {
                        info!(chat_id = %summary.id, "created chat");
                        state.chat_id = Some(summary.id.clone());
                        state.title = summary.title.clone();
                    }
                    summary.id
                }
                Err(e) => {
                    warn!(error = %e, "failed to create chat");
                    self.settle(generation, |t| t.revert(pending));
                    return Err(e.into());
                }
            },
        };

        match self.service.send_message(&chat_id, content).await {
            Ok(reply) => {
                let applied = self.settle(generation, |t| t.commit(pending, reply.clone()));
                debug!(%chat_id, applied, "message sent");
                Ok(reply)
            }
            Err(e) => {
                warn!(%chat_id, error = %e, "send failed, rolling back");
                self.settle(generation, |t| t.revert(pending));
                Err(e.into())
            }
        }
    }

    /// Load a chat and make it the open one.
    ///
    /// When several opens overlap, only the most recent one is applied; the
    /// others fail with [`ChatError::Superseded`].
    pub async fn open_chat(&self, chat_id: &str) -> Result<()> {
        let chat_id = chat_id.trim();
        if chat_id.is_empty() {
            return Err(ChatError::MissingChatId);
        }
        let ticket = self.open_requests.fetch_add(1, Ordering::SeqCst) + 1;

        let chat = self.service.get_chat(chat_id).await?;

        let mut state = self.lock();
        if self.open_requests.load(Ordering::SeqCst) != ticket {
            debug!(chat_id, "discarding stale chat load");
            return Err(ChatError::Superseded(chat_id.to_string()));
        }
        info!(chat_id = %chat.id, messages = chat.messages.len(), "opened chat");
        state.switch_to(Some(chat.id), chat.title, chat.messages);
        Ok(())
    }

    /// Replace the message at `index` and adopt the service's transcript.
    pub async fn edit_message(&self, index: usize, content: &str) -> Result<Vec<ChatMessage>> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let _busy = BusyGuard::acquire(&self.busy)?;
        let (chat_id, generation) = self.target(index)?;

        let messages = self.service.edit_message(&chat_id, index, content).await?;
        self.adopt(generation, &messages);
        Ok(messages)
    }

    /// Regenerate the response at `index` and adopt the service's transcript.
    pub async fn regenerate_response(&self, index: usize) -> Result<Vec<ChatMessage>> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        let (chat_id, generation) = self.target(index)?;

        let messages = self.service.regenerate_response(&chat_id, index).await?;
        self.adopt(generation, &messages);
        Ok(messages)
    }

    /// Drop the open chat and start an unsaved one.
    pub fn new_chat(&self) {
        self.open_requests.fetch_add(1, Ordering::SeqCst);
        self.lock().switch_to(None, None, Vec::new());
    }

    /// List the user's chats.
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        Ok(self.service.list_chats().await?)
    }

    /// Delete a chat. Deleting the open chat also resets the session.
    pub async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let chat_id = chat_id.trim();
        if chat_id.is_empty() {
            return Err(ChatError::MissingChatId);
        }
        self.service.delete_chat(chat_id).await?;

        let is_open = self.lock().chat_id.as_deref() == Some(chat_id);
        if is_open {
            self.new_chat();
        }
        info!(chat_id, "deleted chat");
        Ok(())
    }

    /// Snapshot of the transcript, pending message included.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().transcript.messages().to_vec()
    }

    pub fn chat_id(&self) -> Option<String> {
        self.lock().chat_id.clone()
    }

    pub fn title(&self) -> Option<String> {
        self.lock().title.clone()
    }

    /// Check if a send, edit or regenerate is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open chat id and generation, after checking `index` against the transcript.
    fn target(&self, index: usize) -> Result<(String, u64)> {
        let state = self.lock();
        let chat_id = state.chat_id.clone().ok_or(ChatError::NoActiveChat)?;
        let len = state.transcript.len();
        if index >= len {
            return Err(ChatError::InvalidIndex { index, len });
        }
        Ok((chat_id, state.generation))
    }

    /// Apply `f` to the transcript if no chat switch happened since `generation`.
    fn settle(&self, generation: u64, f: impl FnOnce(&mut Transcript) -> bool) -> bool {
        let mut state = self.lock();
        state.generation == generation && f(&mut state.transcript)
    }

    fn adopt(&self, generation: u64, messages: &[ChatMessage]) {
        let mut state = self.lock();
        if state.generation == generation {
            state.transcript.replace(messages.to_vec());
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("service", &self.service.name())
            .field("state", &*self.lock())
            .field("busy", &self.is_busy())
            .finish()
    }
}
