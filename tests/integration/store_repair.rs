// tests/integration/store_repair.rs

use std::time::{Duration, UNIX_EPOCH};

use menusync::store::memory::{CredentialRecord, PortalRecord};
use menusync::store::{Action, ActionStatus, MemoryStore, RepairReport, SyncStore};
use menusync::types::{PortalFeatures, SyncScope};

fn action(entry: i64, status: ActionStatus, reserved: u32, offered: u32) -> Action {
    Action {
        credential_id: 10,
        portal_id: 1,
        menu_entry_id: entry,
        status,
        reserved,
        offered,
    }
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_portal(
        1,
        PortalRecord {
            name: "P".to_string(),
            plugin: "demo".to_string(),
            features: PortalFeatures::empty(),
            last_menu_date: None,
        },
    );
    for (credential_id, group_id, user_id) in [(10, 2, 1), (11, 1, 2)] {
        store.add_credential(
            credential_id,
            CredentialRecord {
                portal_id: 1,
                group_id,
                user_id,
                credit: None,
            },
        );
    }
    store
}

#[test]
fn test_failed_action_retried_locally_is_deleted() {
    let store = seeded_store();
    store.add_action(action(100, ActionStatus::Failed, 1, 0));
    store.add_action(action(100, ActionStatus::Local, 2, 0));
    store.add_action(action(100, ActionStatus::Synced, 2, 0));

    let report = store.repair_actions().unwrap();

    assert_eq!(report.deleted_failed, 1);
    assert_eq!(report.marked_failed, 0);
    // The retry itself went through and is dropped as well.
    assert_eq!(report.synced_deleted, 1);
    let statuses: Vec<ActionStatus> = store.actions().iter().map(|a| a.status).collect();
    assert_eq!(statuses, vec![ActionStatus::Synced]);
}

#[test]
fn test_local_action_conflicting_with_portal_is_marked_failed() {
    let store = seeded_store();
    store.add_action(action(100, ActionStatus::Local, 2, 0));
    store.add_action(action(100, ActionStatus::Synced, 1, 0));

    let report = store.repair_actions().unwrap();

    assert_eq!(report.marked_failed, 1);
    assert_eq!(report.synced_deleted, 0);
    assert_eq!(store.actions()[0].status, ActionStatus::Failed);
}

#[test]
fn test_unconfirmed_order_is_marked_failed_and_empty_one_is_dropped() {
    let store = seeded_store();
    // Nothing synced for either entry.
    store.add_action(action(100, ActionStatus::Local, 1, 0));
    store.add_action(action(200, ActionStatus::Local, 0, 0));

    let report = store.repair_actions().unwrap();

    assert_eq!(report.marked_failed, 1);
    assert_eq!(report.synced_deleted, 1);
    let actions = store.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].menu_entry_id, 100);
    assert_eq!(actions[0].status, ActionStatus::Failed);
}

#[test]
fn test_confirmed_order_is_deleted() {
    let store = seeded_store();
    store.add_action(action(100, ActionStatus::Local, 1, 1));
    store.add_action(action(100, ActionStatus::Synced, 1, 1));

    let report = store.repair_actions().unwrap();

    assert_eq!(
        report,
        RepairReport {
            deleted_failed: 0,
            marked_failed: 0,
            synced_deleted: 1,
        }
    );
    assert_eq!(store.actions(), vec![action(100, ActionStatus::Synced, 1, 1)]);
}

#[test]
fn test_repeated_repair_keeps_action_list_bounded() {
    let store = seeded_store();
    store.add_action(action(100, ActionStatus::Local, 2, 0));
    store.add_action(action(100, ActionStatus::Synced, 2, 0));
    store.add_action(action(200, ActionStatus::Local, 0, 0));

    let first = store.repair_actions().unwrap();
    let second = store.repair_actions().unwrap();

    assert_eq!(first.synced_deleted, 2);
    assert_eq!(second, RepairReport::default());
    assert_eq!(store.actions(), vec![action(100, ActionStatus::Synced, 2, 0)]);
}

#[test]
fn test_rows_are_sorted_and_scoped() {
    let store = seeded_store();

    let rows = store.sync_rows(SyncScope::All).unwrap();
    let keys: Vec<(i64, i64)> = rows
        .iter()
        .map(|r| (r.credential_group_id, r.credential_id))
        .collect();
    assert_eq!(keys, vec![(1, 11), (2, 10)]);

    let rows = store.sync_rows(SyncScope::User(1)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].credential_id, 10);
}

#[test]
fn test_bookkeeping_writes() {
    let store = seeded_store();

    store.set_credit(10, 420).unwrap();
    store.set_last_menu_date(1, 20_100).unwrap();
    let at = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    store.set_last_sync(at).unwrap();

    assert_eq!(store.current_credit(10).unwrap(), Some(420));
    assert_eq!(store.current_credit(11).unwrap(), None);
    assert_eq!(store.last_menu_date(1).unwrap(), Some(20_100));
    assert_eq!(store.last_sync().unwrap(), Some(at));

    assert!(store.set_credit(99, 1).is_err());
    assert!(store.set_last_menu_date(9, 1).is_err());
}
