//! Relay session state.
//!
//! Two small state machines, both owned by the router:
//! - `CoopState`: whether the two coop channels are currently linked
//! - `PollState`: whether a poll announcement is currently open
//!
//! Nothing here is persisted; a restart begins with coop inactive and no poll open.

/// Coop link state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoopState {
    #[default]
    Inactive,
    Active,
}

/// Poll announcement state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollState {
    #[default]
    Idle,
    Open,
}

/// Mutable session flags read before every routing decision.
#[derive(Debug, Default)]
pub struct SessionState {
    coop: CoopState,
    poll: PollState,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coop(&self) -> CoopState {
        self.coop
    }

    pub fn coop_active(&self) -> bool {
        self.coop == CoopState::Active
    }

    pub fn poll(&self) -> PollState {
        self.poll
    }

    /// `Inactive -> Active`. Returns false if coop was already active.
    pub(super) fn enter_coop(&mut self) -> bool {
        match self.coop {
            CoopState::Inactive => {
                self.coop = CoopState::Active;
                true
            }
            CoopState::Active => false,
        }
    }

    /// `Active -> Inactive`. Returns false if coop was not active.
    pub(super) fn exit_coop(&mut self) -> bool {
        match self.coop {
            CoopState::Active => {
                self.coop = CoopState::Inactive;
                true
            }
            CoopState::Inactive => false,
        }
    }

    /// `Idle -> Open`. Returns false for repeated "poll running" signals.
    pub(super) fn open_poll(&mut self) -> bool {
        match self.poll {
            PollState::Idle => {
                self.poll = PollState::Open;
                true
            }
            PollState::Open => false,
        }
    }

    /// `Open -> Idle`. Returns false if no poll was open.
    pub(super) fn close_poll(&mut self) -> bool {
        match self.poll {
            PollState::Open => {
                self.poll = PollState::Idle;
                true
            }
            PollState::Idle => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SessionState::new();
        assert!(!state.coop_active());
        assert_eq!(state.poll(), PollState::Idle);
    }

    #[test]
    fn test_coop_transitions() {
        let mut state = SessionState::new();
        assert!(!state.exit_coop());
        assert!(state.enter_coop());
        assert!(state.coop_active());
        assert!(!state.enter_coop());
        assert!(state.exit_coop());
        assert_eq!(state.coop(), CoopState::Inactive);
    }

    #[test]
    fn test_poll_transitions() {
        let mut state = SessionState::new();
        assert!(!state.close_poll());
        assert!(state.open_poll());
        assert!(!state.open_poll());
        assert!(!state.open_poll());
        assert!(state.close_poll());
        assert!(!state.close_poll());
        assert!(state.open_poll());
    }

    #[test]
    fn test_poll_and_coop_are_independent() {
        let mut state = SessionState::new();
        state.enter_coop();
        state.open_poll();
        state.exit_coop();
        assert_eq!(state.poll(), PollState::Open);
    }
}
