// tests/integration/end_to_end.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use menusync::config::{load_from_str, ConfigFile, GroupOutcome};
use menusync::contract::{SyncResult, TaskFlags, TestResult as PortalTest};
use menusync::engine::{SyncCoordinator, SyncEvent};
use menusync::errors::SyncError;
use menusync::exec::LocalPluginBackend;
use menusync::groups::SessionContext;
use menusync::plugin::{Plugin, PluginRegistry};
use menusync::store::{MemoryStore, SyncStore};
use menusync::types::SyncScope;
use menusync::{build_plugins, build_store};
use menusync_test_utils::builders::{
    row, store_with_rows, ConfigFileBuilder, GroupConfigBuilder, PluginConfigBuilder,
};
use menusync_test_utils::doubles::CountingGroup;
use menusync_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn local_coordinator(
    cfg: &ConfigFile,
    timeout: Duration,
) -> Result<(MemoryStore, SyncCoordinator<LocalPluginBackend>), Box<dyn Error>> {
    let store = build_store(cfg);
    let shared: Arc<dyn SyncStore> = Arc::new(store.clone());
    let plugins = build_plugins(cfg, Arc::clone(&shared))?;
    let backend = LocalPluginBackend::new(Arc::new(plugins));
    Ok((store, SyncCoordinator::new(backend, shared, timeout)))
}

/// Portal 1 with two credentials, served by plugin "demo":
/// menu -> history(+credit).
fn demo_config(history: GroupConfigBuilder) -> ConfigFile {
    ConfigFileBuilder::new()
        .with_portal(1, "demo")
        .with_menu_date(1, 20_000)
        .with_credential(10, 1, 1, 1)
        .with_credential(11, 1, 1, 2)
        .with_credit(10, 1_000)
        .with_plugin(
            "demo",
            PluginConfigBuilder::new()
                .group(
                    "menu",
                    GroupConfigBuilder::new(&["menu", "group_menu", "remaining_to_take", "remaining_to_order"])
                        .writes_menu_date(20_005)
                        .build(),
                )
                .group(
                    "history",
                    history.after("menu").build(),
                )
                .group("present", GroupConfigBuilder::new(&["action_present"]).build())
                .build(),
        )
        .build()
}

#[tokio::test]
async fn test_scripted_plugins_sync_and_report_changes() -> TestResult {
    init_tracing();

    let cfg = demo_config(GroupConfigBuilder::new(&["action_history", "credit"]).writes_credit(800));
    let (store, coordinator) = local_coordinator(&cfg, Duration::from_secs(2))?;
    let mut rx = coordinator.events().subscribe();

    let summary = with_timeout(coordinator.run_sync(TaskFlags::all(), SyncScope::All)).await?;

    assert_eq!(summary.worst, SyncResult::Ok);
    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.replied, 2);
    assert_eq!(store.current_credit(10)?, Some(800));
    assert_eq!(store.last_menu_date(1)?, Some(20_005));

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(events.contains(&SyncEvent::CreditChanged {
        credential_id: 10,
        previous: 1_000,
        current: 800,
    }));
    assert!(events.contains(&SyncEvent::NewMenu {
        portal_id: 1,
        previous: 20_000,
        current: 20_005,
    }));
    Ok(())
}

#[tokio::test]
async fn test_scripted_failure_surfaces_as_worst_result() -> TestResult {
    init_tracing();

    let cfg = demo_config(
        GroupConfigBuilder::new(&["action_history", "credit"]).outcome(GroupOutcome::WrongCredentials),
    );
    let (store, coordinator) = local_coordinator(&cfg, Duration::from_secs(2))?;

    let summary = with_timeout(coordinator.run_sync(TaskFlags::all(), SyncScope::All)).await?;

    assert_eq!(summary.worst, SyncResult::WrongCredentials);
    assert_eq!(store.current_credit(10)?, Some(1_000));
    assert!(summary.repair.is_some());
    Ok(())
}

#[tokio::test]
async fn test_slow_plugin_times_out() -> TestResult {
    init_tracing();

    let cfg = demo_config(
        GroupConfigBuilder::new(&["action_history", "credit"]).delay_ms(1_000),
    );
    let (_store, coordinator) = local_coordinator(&cfg, Duration::from_millis(150))?;

    let summary = with_timeout(coordinator.run_sync(TaskFlags::all(), SyncScope::All)).await?;

    assert_eq!(summary.worst, SyncResult::PluginTimeout);
    assert!(summary.timed_out);
    Ok(())
}

#[tokio::test]
async fn test_remaining_pass_for_one_user() -> TestResult {
    let cfg = demo_config(GroupConfigBuilder::new(&["action_history", "credit"]));
    let (_store, coordinator) = local_coordinator(&cfg, Duration::from_secs(2))?;

    let plan = coordinator.plan(
        cfg.sync.filter_for(menusync::types::SyncAction::Remaining),
        SyncScope::User(2),
    )?;

    assert_eq!(plan.sessions.len(), 1);
    assert_eq!(plan.sessions[0].row.credential_id, 11);
    assert_eq!(
        plan.sessions[0].tasks,
        TaskFlags::REMAINING_TO_TAKE_SYNC | TaskFlags::REMAINING_TO_ORDER_SYNC | TaskFlags::CREDIT_SYNC
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_plugin_replies_not_supported() -> TestResult {
    init_tracing();

    let cfg = demo_config(GroupConfigBuilder::new(&["action_history", "credit"]));
    let store = build_store(&cfg);
    let shared: Arc<dyn SyncStore> = Arc::new(store);
    // Nothing registered under "demo".
    let backend = LocalPluginBackend::new(Arc::new(PluginRegistry::new()));
    let coordinator = SyncCoordinator::new(backend, shared, Duration::from_secs(2));

    let summary = with_timeout(coordinator.run_sync(TaskFlags::all(), SyncScope::All)).await?;

    assert_eq!(summary.worst, SyncResult::NotSupported);
    assert_eq!(summary.replied, 2);
    Ok(())
}

#[test]
fn test_portal_test_and_formats_from_toml() -> TestResult {
    let raw = load_from_str(
        r#"
[portal.1]
name = "P"
plugin = "demo"

[plugin.demo]
portal_test = "invalid_data"

[[plugin.demo.portal_format]]
code = "url"
name = "Address"
pattern = "https://.*"

[plugin.demo.group.menu]
provides = ["menu"]
"#,
    )?;
    let cfg = ConfigFile::try_from(raw)?;
    let store: Arc<dyn SyncStore> = Arc::new(build_store(&cfg));
    let plugins = build_plugins(&cfg, store)?;

    let plugin = plugins.lookup("demo")?;
    let ctx = SessionContext {
        plugin: "demo".to_string(),
        portal_id: 1,
        credential_id: 0,
    };

    assert_eq!(plugin.test_portal(&ctx), PortalTest::InvalidData);
    assert_eq!(plugin.supported_tasks(), TaskFlags::MENU_SYNC);
    assert!(plugin.portal_formats()[0].validate("https://canteen.example")?);
    assert_eq!(plugins.job_id("demo"), Some(0));
    Ok(())
}

#[test]
fn test_cyclic_plugin_is_rejected_when_built() {
    let a = CountingGroup::new("A", TaskFlags::MENU_SYNC)
        .after(TaskFlags::GROUP_DATA_MENU_SYNC)
        .shared();
    let b = CountingGroup::new("B", TaskFlags::GROUP_DATA_MENU_SYNC)
        .after(TaskFlags::MENU_SYNC)
        .shared();

    match Plugin::builder("fake").group(a).group(b).build() {
        Err(SyncError::DagCycle(msg)) => assert!(msg.contains("cycle detected")),
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[tokio::test]
async fn test_plugin_with_unprovided_dependency_aborts_the_pass() -> TestResult {
    init_tracing();

    // H needs the menu, which this plugin never provides.
    let h = CountingGroup::new("H", TaskFlags::ACTION_HISTORY_SYNC)
        .after(TaskFlags::MENU_SYNC)
        .shared();
    let mut plugins = PluginRegistry::new();
    plugins.register(Plugin::builder("fake").group(h.clone()).build()?)?;

    let store = store_with_rows(&[row(1, 10, 1)]);
    let shared: Arc<dyn SyncStore> = Arc::new(store.clone());
    let backend = LocalPluginBackend::new(Arc::new(plugins));
    let coordinator = SyncCoordinator::new(backend, shared, Duration::from_secs(2));

    let result = with_timeout(coordinator.run_sync(TaskFlags::all(), SyncScope::All)).await;

    match result {
        Err(SyncError::PluginFailed {
            portal_id,
            credential_id,
            message,
        }) => {
            assert_eq!((portal_id, credential_id), (1, 10));
            assert!(message.contains("menu"));
        }
        Err(e) => panic!("Expected PluginFailed error, got: {:?}", e),
        Ok(summary) => panic!("Expected error, got Ok: {:?}", summary),
    }
    assert_eq!(h.runs(), 0);
    assert!(store.last_sync()?.is_none());
    Ok(())
}
