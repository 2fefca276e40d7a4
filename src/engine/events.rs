// src/engine/events.rs

//! Fire-and-forget notifications about sync passes.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::contract::{SyncResult, TaskFlags};
use crate::types::{CredentialId, PortalId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SyncEvent {
    /// A pass started with this task filter.
    Started { tasks: TaskFlags },
    /// The credit of a credential changed during the pass.
    CreditChanged {
        credential_id: CredentialId,
        previous: i64,
        current: i64,
    },
    /// A portal published menu for later days than before.
    NewMenu {
        portal_id: PortalId,
        previous: i64,
        current: i64,
    },
    /// The pass finished with this aggregate result.
    Finished { worst: SyncResult },
}

/// Broadcast bus for [`SyncEvent`]s.
///
/// Publishing never blocks and never fails; events sent while nobody
/// listens are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn publish(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
