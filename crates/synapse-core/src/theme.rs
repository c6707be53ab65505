//! Theme preference for Synapse front-ends.
//!
//! The user picks `light`, `dark` or `system`; the front-end renders one of
//! two appearances. The preference persists under the `theme` storage key.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynapseError};
use crate::storage::{KeyValueStore, THEME_KEY};

/// Stored theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreference {
    Light,
    Dark,
    /// Follow the operating system
    #[default]
    System,
}

impl ThemePreference {
    /// All preferences in cycle order.
    pub fn all() -> &'static [ThemePreference] {
        &[
            ThemePreference::Light,
            ThemePreference::Dark,
            ThemePreference::System,
        ]
    }

    /// Get the next preference in the cycle.
    pub fn next(&self) -> ThemePreference {
        let prefs = Self::all();
        let current_idx = prefs.iter().position(|p| p == self).unwrap_or(0);
        prefs[(current_idx + 1) % prefs.len()]
    }

    /// Value written to storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }
}

impl FromStr for ThemePreference {
    type Err = SynapseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            _ => Err(SynapseError::invalid_value("theme", s)),
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What actually gets rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appearance {
    Light,
    Dark,
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// Theme state shared with the component tree.
pub struct ThemeContext {
    preference: ThemePreference,
    system_dark: bool,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl ThemeContext {
    /// Context that is not persisted.
    pub fn new(preference: ThemePreference, system_dark: bool) -> Self {
        Self {
            preference,
            system_dark,
            store: None,
        }
    }

    /// Load the stored preference. Missing or unrecognized values fall back
    /// to [`ThemePreference::System`].
    pub fn load(store: Arc<dyn KeyValueStore>, system_dark: bool) -> Result<Self> {
        let preference = match store.get(THEME_KEY)? {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::debug!(error = %e, "ignoring stored theme preference");
                ThemePreference::System
            }),
            None => ThemePreference::System,
        };

        Ok(Self {
            preference,
            system_dark,
            store: Some(store),
        })
    }

    pub fn preference(&self) -> ThemePreference {
        self.preference
    }

    /// Resolve the preference against the current OS setting.
    pub fn resolved(&self) -> Appearance {
        match self.preference {
            ThemePreference::Light => Appearance::Light,
            ThemePreference::Dark => Appearance::Dark,
            ThemePreference::System if self.system_dark => Appearance::Dark,
            ThemePreference::System => Appearance::Light,
        }
    }

    /// Record an OS appearance change.
    pub fn set_system_dark(&mut self, dark: bool) {
        self.system_dark = dark;
    }

    /// Change and persist the preference.
    pub fn set_preference(&mut self, preference: ThemePreference) -> Result<()> {
        if let Some(store) = &self.store {
            store.set(THEME_KEY, preference.as_str())?;
        }
        self.preference = preference;
        tracing::debug!(theme = %preference, "theme preference changed");
        Ok(())
    }

    /// Move to the next preference and persist it.
    pub fn cycle(&mut self) -> Result<ThemePreference> {
        let next = self.preference.next();
        self.set_preference(next)?;
        Ok(next)
    }
}

impl std::fmt::Debug for ThemeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeContext")
            .field("preference", &self.preference)
            .field("system_dark", &self.system_dark)
            .field("persisted", &self.store.is_some())
            .finish()
    }
}
