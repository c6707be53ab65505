//! Cooldown for re-authentication prompts.
//!
//! A burst of requests failing with 401 at the same time should produce one
//! toast and one sign-in modal, not one per request.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default minimum gap between two prompts.
pub const DEFAULT_PROMPT_COOLDOWN: Duration = Duration::from_secs(10);

/// Tracks when the user was last prompted to sign in again.
#[derive(Debug)]
pub struct AuthPromptGuard {
    cooldown: Duration,
    last_prompted: Mutex<Option<Instant>>,
}

impl AuthPromptGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_prompted: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Check whether a prompt may be shown now, and record it if so.
    pub fn should_prompt(&self) -> bool {
        self.should_prompt_at(Instant::now())
    }

    /// Check whether a prompt may be shown at `now`, and record it if so.
    ///
    /// Check and record happen under one lock, so concurrent callers see
    /// exactly one `true` per window.
    pub fn should_prompt_at(&self, now: Instant) -> bool {
        let mut last = self.last_prompted.lock().unwrap_or_else(PoisonError::into_inner);
        let allowed = match *last {
            Some(previous) => now.saturating_duration_since(previous) >= self.cooldown,
            None => true,
        };
        if allowed {
            *last = Some(now);
        }
        allowed
    }

    /// Time left before the next prompt is allowed.
    pub fn remaining(&self, now: Instant) -> Duration {
        let last = self.last_prompted.lock().unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(previous) => self
                .cooldown
                .saturating_sub(now.saturating_duration_since(previous)),
            None => Duration::ZERO,
        }
    }

    /// Forget the last prompt, e.g. after a successful login.
    pub fn reset(&self) {
        *self.last_prompted.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for AuthPromptGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_COOLDOWN)
    }
}
