//! Deferred state transitions

use tracing::debug;

/// What the engine should do after the current update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Stop the engine
    Quit,
    /// Make the named state current
    Switch(String),
}

/// A transition recorded during an update and applied after it
#[derive(Debug, Default)]
pub struct PendingTransition {
    requested: Option<Transition>,
}

impl PendingTransition {
    /// Record a request; no target means quit. Later requests win.
    pub fn request(&mut self, target: Option<String>) {
        let transition = match target {
            Some(name) => Transition::Switch(name),
            None => Transition::Quit,
        };
        if let Some(previous) = &self.requested {
            debug!(?previous, next = ?transition, "Overriding pending transition");
        }
        self.requested = Some(transition);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.is_some()
    }

    /// Consume the pending request
    pub fn take(&mut self) -> Option<Transition> {
        self.requested.take()
    }
}
