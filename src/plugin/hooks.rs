// src/plugin/hooks.rs

use tracing::warn;

use crate::contract::TestResult;
use crate::groups::{SessionContext, TaskFailure};

/// Lifecycle hooks around one sync session.
///
/// Plugins use them to open and close their own portal session (log in,
/// log out). Both are called exactly once per session that runs at least
/// one task group.
pub trait SessionHooks: Send + Sync {
    fn on_session_start(&self, _ctx: &SessionContext) -> Result<(), TaskFailure> {
        Ok(())
    }

    fn on_session_end(&self, _ctx: &SessionContext) -> Result<(), TaskFailure> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl SessionHooks for NoopHooks {}

/// Answers the portal-test side channel.
pub trait PortalTester: Send + Sync {
    fn test_portal(&self, ctx: &SessionContext) -> TestResult;
}

/// A fixed answer.
impl PortalTester for TestResult {
    fn test_portal(&self, _ctx: &SessionContext) -> TestResult {
        *self
    }
}

/// Calls `on_session_end` when dropped unless [`SessionGuard::finish`] did.
///
/// This keeps the start/end pairing intact when the session is left early,
/// by an error return or by a panicking task group.
pub(crate) struct SessionGuard<'a> {
    hooks: &'a dyn SessionHooks,
    ctx: &'a SessionContext,
    armed: bool,
}

impl<'a> SessionGuard<'a> {
    pub(crate) fn new(hooks: &'a dyn SessionHooks, ctx: &'a SessionContext) -> Self {
        Self {
            hooks,
            ctx,
            armed: true,
        }
    }

    pub(crate) fn finish(mut self) -> Result<(), TaskFailure> {
        self.armed = false;
        self.hooks.on_session_end(self.ctx)
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(failure) = self.hooks.on_session_end(self.ctx) {
            warn!(session = %self.ctx, error = %failure, "session end hook failed");
        }
    }
}
