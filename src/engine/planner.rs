// src/engine/planner.rs

//! Pure planning of a sync pass: which tasks each (portal, credential) pair
//! owes.
//!
//! The scan is sequential over rows sorted by `(credential_group_id,
//! portal_id)`; "first row of a credential" and "first row of a portal" are
//! decided in that order.

use std::collections::HashSet;

use crate::contract::TaskFlags;
use crate::store::SyncRow;
use crate::types::{CredentialId, PortalFeatures, PortalId};

/// A pair that will be contacted, with the tasks it owes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSession {
    pub row: SyncRow,
    pub tasks: TaskFlags,
}

/// Outcome of planning one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Pairs to dispatch, in scan order.
    pub sessions: Vec<PlannedSession>,
    /// Pairs whose owed tasks were all filtered out.
    pub skipped: Vec<SyncRow>,
}

impl SyncPlan {
    /// Number of pairs the pass covers, dispatched or not.
    pub fn in_scope(&self) -> usize {
        self.sessions.len() + self.skipped.len()
    }
}

/// Tasks a row owes before filtering.
pub fn owed_tasks(features: PortalFeatures, first_of_credential: bool, first_of_portal: bool) -> TaskFlags {
    let mut tasks = TaskFlags::ACTIONS;

    if first_of_credential {
        tasks |= TaskFlags::CREDIT_SYNC;
    }

    if first_of_portal {
        tasks |= TaskFlags::FULL_MENU;
    } else if features.contains(PortalFeatures::GROUP_FULL_SYNC) {
        tasks |= TaskFlags::GROUP_DATA_MENU_SYNC;
    }

    tasks
}

/// Plan a pass over `rows` restricted to `filter`.
pub fn plan_sync(rows: &[SyncRow], filter: TaskFlags) -> SyncPlan {
    let mut sorted: Vec<&SyncRow> = rows.iter().collect();
    sorted.sort_by_key(|row| (row.credential_group_id, row.portal_id));

    let mut seen_credentials: HashSet<CredentialId> = HashSet::new();
    let mut seen_portals: HashSet<PortalId> = HashSet::new();
    let mut plan = SyncPlan::default();

    for row in sorted {
        let first_of_credential = seen_credentials.insert(row.credential_id);
        let first_of_portal = seen_portals.insert(row.portal_id);

        let tasks = owed_tasks(row.features, first_of_credential, first_of_portal) & filter;

        if tasks.is_empty() {
            plan.skipped.push(row.clone());
        } else {
            plan.sessions.push(PlannedSession {
                row: row.clone(),
                tasks,
            });
        }
    }

    plan
}
