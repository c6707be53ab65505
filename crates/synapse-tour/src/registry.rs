//! Tour definitions loaded from YAML.
//!
//! A tour file holds a list of [`HelpConfig`]s:
//!
//! ```yaml
//! - page_id: dashboard
//!   title: Dashboard tour
//!   steps:
//!     - id: welcome
//!       title: Welcome to Synapse
//!       content: Here's a quick look around.
//!     - id: courses
//!       title: Your courses
//!       content: Everything you are studying lives here.
//!       target: "#courses"
//!       position: bottom
//!       offset: { x: 0, y: 4 }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, TourError};
use crate::types::HelpConfig;

/// Tours keyed by page id.
#[derive(Debug, Clone, Default)]
pub struct TourRegistry {
    tours: BTreeMap<String, HelpConfig>,
}

impl TourRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a tour list.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::parse(content, None)
    }

    /// Load a tour file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TourError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::parse(&content, Some(path))?;
        debug!(path = %path.display(), tours = registry.len(), "loaded tours");
        Ok(registry)
    }

    fn parse(content: &str, path: Option<&Path>) -> Result<Self> {
        let configs: Vec<HelpConfig> = if content.trim().is_empty() {
            Vec::new()
        } else {
            serde_yaml::from_str(content).map_err(|source| TourError::Parse {
                path: path.map(Path::to_path_buf),
                source,
            })?
        };

        let mut registry = Self::new();
        for config in configs {
            registry.insert(config)?;
        }
        Ok(registry)
    }

    /// Register a tour, replacing any tour for the same page.
    pub fn insert(&mut self, config: HelpConfig) -> Result<()> {
        validate(&config)?;
        if let Some(previous) = self.tours.insert(config.page_id.clone(), config) {
            warn!(page_id = %previous.page_id, "tour redefined, keeping the later one");
        }
        Ok(())
    }

    /// Tour for `page_id`.
    pub fn get(&self, page_id: &str) -> Result<&HelpConfig> {
        self.tours
            .get(page_id)
            .ok_or_else(|| TourError::UnknownPage(page_id.to_string()))
    }

    pub fn page_ids(&self) -> impl Iterator<Item = &str> {
        self.tours.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }
}

fn validate(config: &HelpConfig) -> Result<()> {
    if config.page_id.trim().is_empty() {
        return Err(TourError::invalid("", "page_id is empty"));
    }

    let mut seen = HashSet::new();
    for step in &config.steps {
        if step.id.trim().is_empty() {
            return Err(TourError::invalid(&config.page_id, "step with empty id"));
        }
        if !seen.insert(step.id.as_str()) {
            return Err(TourError::invalid(
                &config.page_id,
                format!("duplicate step id '{}'", step.id),
            ));
        }
        if let Some(target) = &step.target
            && target.trim().is_empty()
        {
            return Err(TourError::invalid(
                &config.page_id,
                format!("step '{}' has an empty target", step.id),
            ));
        }
    }
    Ok(())
}
