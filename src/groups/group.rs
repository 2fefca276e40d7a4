// src/groups/group.rs

use std::fmt;

use thiserror::Error;

use crate::contract::{SyncResult, TaskFlags};
use crate::types::{CredentialId, PluginId, PortalId};

/// What a task group is run against: one credential of one portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub plugin: PluginId,
    pub portal_id: PortalId,
    pub credential_id: CredentialId,
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[portal={}, credential={}]",
            self.plugin, self.portal_id, self.credential_id
        )
    }
}

/// Failure of one task group run.
///
/// These are recovered at group granularity: the failure is recorded against
/// the requested flags the group provides and the rest of the session goes on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFailure {
    #[error("wrong credentials: {0}")]
    WrongCredentials(String),

    #[error("portal format changed: {0}")]
    FormatChanged(String),

    #[error("portal under maintenance: {0}")]
    Maintenance(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl TaskFailure {
    pub fn sync_result(&self) -> SyncResult {
        match self {
            TaskFailure::WrongCredentials(_) => SyncResult::WrongCredentials,
            TaskFailure::FormatChanged(_) => SyncResult::UnknownPortalFormat,
            TaskFailure::Maintenance(_) => SyncResult::PortalTemporarilyInaccessible,
            TaskFailure::Io(_) => SyncResult::IoException,
        }
    }
}

impl From<std::io::Error> for TaskFailure {
    fn from(err: std::io::Error) -> Self {
        TaskFailure::Io(err.to_string())
    }
}

/// A unit of plugin work.
///
/// A group declares the task flags it `provides` and the ones it `depends`
/// on. It runs only after every flag in `depends` was provided by a group
/// that ran successfully earlier in the same session.
pub trait TaskGroup: Send + Sync {
    fn name(&self) -> &str;

    fn provides(&self) -> TaskFlags;

    fn depends(&self) -> TaskFlags {
        TaskFlags::empty()
    }

    /// Do the work. `tasks` is the part of `provides` the session needs,
    /// either because it was requested or because another group depends on it.
    fn run(&self, ctx: &SessionContext, tasks: TaskFlags) -> Result<(), TaskFailure>;
}

impl fmt::Debug for dyn TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGroup")
            .field("name", &self.name())
            .field("provides", &self.provides())
            .field("depends", &self.depends())
            .finish()
    }
}
