// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::errors::{Result, SyncError};
use crate::store::{Action, ActionStatus, RepairReport, SyncRow, SyncStore};
use crate::types::{CredentialGroupId, CredentialId, PluginId, PortalFeatures, PortalId, SyncScope, UserId};

#[derive(Debug, Clone)]
pub struct PortalRecord {
    pub name: String,
    pub plugin: PluginId,
    pub features: PortalFeatures,
    pub last_menu_date: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub portal_id: PortalId,
    pub group_id: CredentialGroupId,
    pub user_id: UserId,
    pub credit: Option<i64>,
}

#[derive(Debug, Default)]
struct Inner {
    portals: BTreeMap<PortalId, PortalRecord>,
    credentials: BTreeMap<CredentialId, CredentialRecord>,
    actions: Vec<Action>,
    last_sync: Option<SystemTime>,
}

/// In-memory [`SyncStore`].
///
/// Cheap to clone; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_portal(&self, portal_id: PortalId, record: PortalRecord) {
        self.lock().portals.insert(portal_id, record);
    }

    pub fn add_credential(&self, credential_id: CredentialId, record: CredentialRecord) {
        self.lock().credentials.insert(credential_id, record);
    }

    pub fn add_action(&self, action: Action) {
        self.lock().actions.push(action);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    pub fn portal(&self, portal_id: PortalId) -> Option<PortalRecord> {
        self.lock().portals.get(&portal_id).cloned()
    }

    pub fn credential(&self, credential_id: CredentialId) -> Option<CredentialRecord> {
        self.lock().credentials.get(&credential_id).cloned()
    }
}

impl SyncStore for MemoryStore {
    fn sync_rows(&self, scope: SyncScope) -> Result<Vec<SyncRow>> {
        let inner = self.lock();
        let mut rows = Vec::new();

        for (credential_id, credential) in &inner.credentials {
            if !scope.includes(credential.user_id) {
                continue;
            }
            let Some(portal) = inner.portals.get(&credential.portal_id) else {
                warn!(
                    credential_id,
                    portal_id = credential.portal_id,
                    "credential refers to unknown portal; skipping"
                );
                continue;
            };
            rows.push(SyncRow {
                portal_id: credential.portal_id,
                credential_id: *credential_id,
                credential_group_id: credential.group_id,
                user_id: credential.user_id,
                plugin: portal.plugin.clone(),
                features: portal.features,
                credit: credential.credit,
            });
        }

        rows.sort_by_key(|row| (row.credential_group_id, row.portal_id, row.credential_id));
        Ok(rows)
    }

    fn current_credit(&self, credential_id: CredentialId) -> Result<Option<i64>> {
        Ok(self
            .lock()
            .credentials
            .get(&credential_id)
            .and_then(|c| c.credit))
    }

    fn set_credit(&self, credential_id: CredentialId, credit: i64) -> Result<()> {
        let mut inner = self.lock();
        let credential = inner.credentials.get_mut(&credential_id).ok_or_else(|| {
            SyncError::ConfigError(format!("unknown credential {credential_id}"))
        })?;
        credential.credit = Some(credit);
        Ok(())
    }

    fn last_menu_date(&self, portal_id: PortalId) -> Result<Option<i64>> {
        Ok(self
            .lock()
            .portals
            .get(&portal_id)
            .and_then(|p| p.last_menu_date))
    }

    fn set_last_menu_date(&self, portal_id: PortalId, date: i64) -> Result<()> {
        let mut inner = self.lock();
        let portal = inner
            .portals
            .get_mut(&portal_id)
            .ok_or_else(|| SyncError::ConfigError(format!("unknown portal {portal_id}")))?;
        portal.last_menu_date = Some(date);
        Ok(())
    }

    fn repair_actions(&self) -> Result<RepairReport> {
        let mut inner = self.lock();
        let mut report = RepairReport::default();

        // Failed actions the user has since replaced with a new local one.
        let before = inner.actions.len();
        let snapshot = inner.actions.clone();
        inner.actions.retain(|action| {
            action.status != ActionStatus::Failed
                || !snapshot
                    .iter()
                    .any(|other| other.status == ActionStatus::Local && other.same_entry(action))
        });
        report.deleted_failed = before - inner.actions.len();

        // Local actions the portal did not confirm.
        let synced: Vec<Action> = inner
            .actions
            .iter()
            .filter(|a| a.status == ActionStatus::Synced)
            .cloned()
            .collect();
        for action in inner.actions.iter_mut() {
            if action.status != ActionStatus::Local {
                continue;
            }
            let conflicting = synced
                .iter()
                .any(|s| s.same_entry(action) && !s.same_amounts(action));
            let confirmed = synced
                .iter()
                .any(|s| s.same_entry(action) && s.same_amounts(action));
            let wants_something = action.reserved != 0 || action.offered != 0;

            if conflicting || (!confirmed && wants_something) {
                action.status = ActionStatus::Failed;
                report.marked_failed += 1;
            }
        }

        // Local actions the portal now holds: confirmed orders, and empty
        // cancellations nothing on the portal contradicts.
        let before = inner.actions.len();
        inner.actions.retain(|action| {
            if action.status != ActionStatus::Local {
                return true;
            }
            let confirmed = synced
                .iter()
                .any(|s| s.same_entry(action) && s.same_amounts(action));
            let conflicting = synced
                .iter()
                .any(|s| s.same_entry(action) && !s.same_amounts(action));
            let empty = action.reserved == 0 && action.offered == 0;
            !(confirmed || (empty && !conflicting))
        });
        report.synced_deleted = before - inner.actions.len();

        if report.deleted_failed > 0 {
            warn!(count = report.deleted_failed, "conflicting failed actions deleted");
        }
        if report.marked_failed > 0 {
            warn!(count = report.marked_failed, "local actions marked as failed");
        }
        debug!(?report, "actions repaired");

        Ok(report)
    }

    fn set_last_sync(&self, at: SystemTime) -> Result<()> {
        self.lock().last_sync = Some(at);
        Ok(())
    }

    fn last_sync(&self) -> Result<Option<SystemTime>> {
        Ok(self.lock().last_sync)
    }
}
