// src/groups/state.rs

//! Per-session state of a task group.

use crate::contract::SyncResult;

/// State of a group within one session (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Needed by the session, waiting on dependencies.
    Pending,
    /// Handed out to the executor.
    Running,
    DoneSuccess,
    /// Failed, or blocked by a failed dependency; carries the result that
    /// its flags get.
    DoneFailed(SyncResult),
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::DoneSuccess | RunState::DoneFailed(_))
    }
}

/// Public, read-only view of a group's session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRunState {
    /// Nothing the session needs comes from this group.
    NotInSession,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed(SyncResult),
}

impl From<Option<RunState>> for GroupRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => GroupRunState::NotInSession,
            Some(RunState::Pending) => GroupRunState::Pending,
            Some(RunState::Running) => GroupRunState::Running,
            Some(RunState::DoneSuccess) => GroupRunState::DoneSuccess,
            Some(RunState::DoneFailed(result)) => GroupRunState::DoneFailed(result),
        }
    }
}

/// Result of reporting one group completion to the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverStep {
    /// Groups marked failed because they depended on the one that failed.
    pub newly_blocked: Vec<usize>,
    /// Whether every group of the session is now terminal.
    pub session_finished: bool,
}
