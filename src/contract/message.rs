// src/contract/message.rs

//! Messages exchanged between the coordinator and plugins.
//!
//! Result codes travel as raw integers so that the receiving side can tell an
//! unknown code apart from a known one instead of failing deserialisation.

use serde::{Deserialize, Serialize};

use crate::contract::{SessionOutcome, SyncResult, TaskFlags};
use crate::errors::Result;
use crate::types::{CredentialId, PluginId, PortalId};

/// Request for one (portal, credential) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub plugin: PluginId,
    pub portal_id: PortalId,
    pub credential_id: CredentialId,
    pub tasks: TaskFlags,
}

/// One `(task bit, result code)` pair of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultEntry {
    pub task: u32,
    pub result: i32,
}

/// Plugin answer to a [`SyncRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReply {
    pub portal_id: PortalId,
    pub credential_id: CredentialId,
    pub results: Vec<TaskResultEntry>,
    pub worst_result: i32,
    pub error_message: Option<String>,
    /// Set when the plugin could not run the session at all (a broken task
    /// group graph, a panic). Receiving it aborts the pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl SyncReply {
    pub fn from_outcome(request: &SyncRequest, outcome: &SessionOutcome) -> Self {
        Self {
            portal_id: request.portal_id,
            credential_id: request.credential_id,
            results: outcome
                .iter()
                .map(|(task, result)| TaskResultEntry {
                    task: task.bits(),
                    result: result.code(),
                })
                .collect(),
            worst_result: outcome.worst().code(),
            error_message: outcome.error_message().map(str::to_string),
            fatal_error: None,
        }
    }

    /// Reply for a session the plugin refused to run.
    pub fn fatal(request: &SyncRequest, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            portal_id: request.portal_id,
            credential_id: request.credential_id,
            results: Vec::new(),
            worst_result: SyncResult::NotSupported.code(),
            error_message: Some(message.clone()),
            fatal_error: Some(message),
        }
    }

    /// Reply marking every requested task as not supported.
    pub fn not_supported(request: &SyncRequest, message: impl Into<String>) -> Self {
        let mut outcome = SessionOutcome::new();
        outcome.record(request.tasks, SyncResult::NotSupported);
        outcome.note_error(message);
        Self::from_outcome(request, &outcome)
    }

    /// Decode the scalar worst result.
    pub fn worst(&self) -> Result<SyncResult> {
        SyncResult::from_code(self.worst_result)
    }

    /// Worst result of the session: the most severe of the scalar and every
    /// per-task code.
    pub fn session_worst(&self) -> Result<SyncResult> {
        let per_task = SyncResult::worst_of(self.task_results()?.into_iter().map(|(_, r)| r));
        Ok(self.worst()?.max(per_task))
    }

    /// Decode the per-task entries.
    pub fn task_results(&self) -> Result<Vec<(TaskFlags, SyncResult)>> {
        self.results
            .iter()
            .map(|entry| {
                Ok((
                    TaskFlags::new(i64::from(entry.task))?,
                    SyncResult::from_code(entry.result)?,
                ))
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
