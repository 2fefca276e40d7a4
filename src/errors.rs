// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::{CredentialId, PortalId};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Cycle detected in task groups: {0}")]
    DagCycle(String),

    /// The resolver reached a fixed point with groups still waiting on flags
    /// that nothing left to run can provide.
    #[error("Task groups {groups:?} can never run: flags {missing} are never provided")]
    UnsatisfiableDependencies { groups: Vec<String>, missing: String },

    #[error("Invalid task flags value {0}")]
    InvalidTaskFlags(i64),

    #[error("Unknown sync result code {0}")]
    UnknownResultCode(i32),

    /// Only the coordinator may report a plugin timeout.
    #[error("Plugin reported PLUGIN_TIMEOUT for portal {portal_id} credential {credential_id}")]
    ForgedTimeout {
        portal_id: PortalId,
        credential_id: CredentialId,
    },

    /// The plugin could not run a session at all.
    #[error("Plugin failed for portal {portal_id} credential {credential_id}: {message}")]
    PluginFailed {
        portal_id: PortalId,
        credential_id: CredentialId,
        message: String,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Configuration errors indicate a programming error in a plugin or in
    /// the config file; they are never retried.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SyncError::ConfigError(_)
                | SyncError::DagCycle(_)
                | SyncError::UnsatisfiableDependencies { .. }
                | SyncError::UnknownResultCode(_)
                | SyncError::ForgedTimeout { .. }
                | SyncError::PluginFailed { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SyncError>;
