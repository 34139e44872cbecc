//! State-change events published on the observer bus

use serde::Serialize;

use crate::state::{Mode, TimeState};

/// What caused a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    Started,
    Paused,
    Reset,
    DurationSet,
    /// A countdown was stopped at zero by the expiry policy
    Expired,
    /// State was reloaded from durable storage (startup or sync update)
    Restored,
    /// A surface became visible or invisible; the clock itself did not change
    Visibility,
}

impl Cause {
    /// True for changes made by this process that must be persisted and
    /// announced to peers.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Cause::Restored | Cause::Visibility)
    }
}

/// Emitted after every change to a [`TimeKeeper`](crate::state::TimeKeeper).
#[derive(Debug, Clone)]
pub struct StateChanged {
    pub mode: Mode,
    pub cause: Cause,
    /// Snapshot taken under the keeper's lock right after the change
    pub state: TimeState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_and_visibility_are_not_mutations() {
        assert!(Cause::Started.is_mutation());
        assert!(Cause::Expired.is_mutation());
        assert!(!Cause::Restored.is_mutation());
        assert!(!Cause::Visibility.is_mutation());
    }
}
