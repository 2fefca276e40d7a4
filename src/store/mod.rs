// src/store/mod.rs

//! Storage the sync pass reads from and writes back to.
//!
//! The coordinator only needs rows of fields; [`SyncStore`] is that boundary.
//! [`memory::MemoryStore`] is the implementation used by the CLI and tests.

use std::fmt::Debug;
use std::time::SystemTime;

use crate::errors::Result;
use crate::types::{CredentialGroupId, CredentialId, PluginId, PortalFeatures, PortalId, SyncScope, UserId};

pub mod memory;

pub use memory::MemoryStore;

/// One (portal, credential) pair in scope of a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRow {
    pub portal_id: PortalId,
    pub credential_id: CredentialId,
    pub credential_group_id: CredentialGroupId,
    pub user_id: UserId,
    pub plugin: PluginId,
    pub features: PortalFeatures,
    /// `None` when the credit has never been synced.
    pub credit: Option<i64>,
}

/// Sync status of a user action (an order or a cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Made by the user, not yet confirmed by the portal.
    Local,
    /// Confirmed by the portal.
    Synced,
    /// The portal refused it.
    Failed,
}

/// A user action on one menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub credential_id: CredentialId,
    pub portal_id: PortalId,
    pub menu_entry_id: i64,
    pub status: ActionStatus,
    pub reserved: u32,
    pub offered: u32,
}

impl Action {
    fn same_entry(&self, other: &Action) -> bool {
        self.credential_id == other.credential_id
            && self.portal_id == other.portal_id
            && self.menu_entry_id == other.menu_entry_id
    }

    fn same_amounts(&self, other: &Action) -> bool {
        self.reserved == other.reserved && self.offered == other.offered
    }
}

/// What a post-sync repair changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Failed actions dropped because the user already retried them.
    pub deleted_failed: usize,
    /// Local actions the portal did not confirm.
    pub marked_failed: usize,
    /// Local actions dropped because the portal now holds them.
    pub synced_deleted: usize,
}

/// Storage interface used by the coordinator and plugins.
///
/// Writes are idempotent per key.
pub trait SyncStore: Send + Sync + Debug {
    /// Rows in scope, sorted by `(credential_group_id, portal_id)`.
    fn sync_rows(&self, scope: SyncScope) -> Result<Vec<SyncRow>>;

    fn current_credit(&self, credential_id: CredentialId) -> Result<Option<i64>>;

    fn set_credit(&self, credential_id: CredentialId, credit: i64) -> Result<()>;

    /// Date of the newest known menu entry of a portal (days since the Unix
    /// epoch), `None` when no menu is known yet.
    fn last_menu_date(&self, portal_id: PortalId) -> Result<Option<i64>>;

    fn set_last_menu_date(&self, portal_id: PortalId, date: i64) -> Result<()>;

    /// Reconcile local actions against what the portals confirmed.
    fn repair_actions(&self) -> Result<RepairReport>;

    fn set_last_sync(&self, at: SystemTime) -> Result<()>;

    fn last_sync(&self) -> Result<Option<SystemTime>>;
}
