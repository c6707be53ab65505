//! Tour step state machine.
//!
//! Inactive until started, then positioned on exactly one step of the
//! active [`HelpConfig`] until stopped. Navigation never leaves the step
//! range; moves past either end are no-ops.

use tracing::{debug, warn};

use crate::types::{HelpConfig, HelpStep};

/// A transition between two walker states. `None` means inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
}

impl StepChange {
    /// Check if this transition ended the tour.
    pub fn is_stop(&self) -> bool {
        self.current.is_none()
    }
}

#[derive(Debug, Clone, Default)]
enum State {
    #[default]
    Inactive,
    Active {
        config: HelpConfig,
        index: usize,
    },
}

/// Walks one tour at a time.
#[derive(Debug, Clone, Default)]
pub struct TourWalker {
    state: State,
}

impl TourWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `config` on its first step, replacing any running tour.
    ///
    /// A config without steps leaves the walker untouched.
    pub fn start(&mut self, config: HelpConfig) -> Option<StepChange> {
        if config.is_empty() {
            warn!(page_id = %config.page_id, "ignoring tour without steps");
            return None;
        }
        debug!(page_id = %config.page_id, steps = config.len(), "tour started");
        let previous = self.current_index();
        self.state = State::Active { config, index: 0 };
        Some(StepChange {
            previous,
            current: Some(0),
        })
    }

    /// Move to the following step. No-op on the last step.
    pub fn next(&mut self) -> Option<StepChange> {
        let index = self.current_index()?;
        self.go_to_step(index + 1)
    }

    /// Move to the preceding step. No-op on the first step.
    pub fn previous(&mut self) -> Option<StepChange> {
        let index = self.current_index()?;
        self.go_to_step(index.checked_sub(1)?)
    }

    /// Jump to step `target` if it exists.
    pub fn go_to_step(&mut self, target: usize) -> Option<StepChange> {
        let State::Active { config, index } = &mut self.state else {
            return None;
        };
        if target >= config.steps.len() || target == *index {
            return None;
        }
        let previous = std::mem::replace(index, target);
        Some(StepChange {
            previous: Some(previous),
            current: Some(target),
        })
    }

    /// Deactivate and drop the config.
    pub fn stop(&mut self) -> Option<StepChange> {
        let previous = self.current_index()?;
        self.state = State::Inactive;
        debug!("tour stopped");
        Some(StepChange {
            previous: Some(previous),
            current: None,
        })
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            State::Active { index, .. } => Some(*index),
            State::Inactive => None,
        }
    }

    pub fn current_step(&self) -> Option<&HelpStep> {
        match &self.state {
            State::Active { config, index } => config.steps.get(*index),
            State::Inactive => None,
        }
    }

    pub fn config(&self) -> Option<&HelpConfig> {
        match &self.state {
            State::Active { config, .. } => Some(config),
            State::Inactive => None,
        }
    }

    pub fn is_first_step(&self) -> bool {
        self.current_index() == Some(0)
    }

    pub fn is_last_step(&self) -> bool {
        match &self.state {
            State::Active { config, index } => *index + 1 == config.steps.len(),
            State::Inactive => false,
        }
    }
}
