// tests/integration/error_handling.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use menusync::config::{load_and_validate, ConfigFile};
use menusync::contract::{TaskFlags, TestResult};
use menusync::errors::{Result, SyncError};
use menusync::types::{PortalFeatures, SyncAction};

fn load(contents: &str) -> Result<ConfigFile> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    load_and_validate(file.path())
}

fn expect_config_error(contents: &str, needle: &str) {
    match load(contents) {
        Err(SyncError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_full_config_loads() {
    let cfg = load(
        r#"
[sync]
plugin_timeout = 15
changes_tasks = ["action_present"]

[portal.1]
name = "School canteen"
plugin = "demo"
features = ["group_full_sync", "food_stock"]
last_menu_date = 20000

[credential.10]
portal = 1
group = 1
user = 3
credit = 1250

[plugin.demo]
portal_test = "invalid_data"

[[plugin.demo.credential_format]]
code = "canteen"
name = "Canteen number"
pattern = "[0-9]{4}"

[plugin.demo.group.menu]
provides = ["menu", "group_menu"]

[plugin.demo.group.history]
provides = ["action_history", "credit"]
depends = ["menu"]
outcome = "wrong_credentials"
"#,
    )
    .unwrap();

    assert_eq!(cfg.sync.plugin_timeout, Duration::from_secs(15));
    assert_eq!(cfg.sync.filter_for(SyncAction::Changes), TaskFlags::ACTION_PRESENT_SYNC);
    assert_eq!(
        cfg.sync.filter_for(SyncAction::Remaining),
        SyncAction::Remaining.default_filter()
    );

    let portal = &cfg.portals[&1];
    assert!(portal.features.contains(PortalFeatures::GROUP_FULL_SYNC));
    assert!(portal.features.contains(PortalFeatures::FOOD_STOCK));
    assert_eq!(portal.last_menu_date, Some(20000));

    assert_eq!(cfg.credentials[&10].credit, Some(1250));

    let plugin = &cfg.plugins["demo"];
    assert_eq!(plugin.portal_test, TestResult::InvalidData);
    assert_eq!(plugin.credential_formats[0].pattern, "[0-9]{4}");
    assert_eq!(plugin.groups.len(), 2);
    let history = plugin.groups.iter().find(|g| g.name == "history").unwrap();
    assert_eq!(history.depends, TaskFlags::MENU_SYNC);
    assert!(history.failure.is_some());
}

#[test]
fn test_group_cycle_returns_structured_error() {
    let result = load(
        r#"
[portal.1]
name = "P"
plugin = "demo"

[plugin.demo.group.a]
provides = ["menu"]
depends = ["group_menu"]

[plugin.demo.group.b]
provides = ["group_menu"]
depends = ["menu"]
"#,
    );

    match result {
        Err(SyncError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("a") || msg.contains("b"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unprovided_dependency_returns_config_error() {
    expect_config_error(
        r#"
[portal.1]
name = "P"
plugin = "demo"

[plugin.demo.group.history]
provides = ["action_history"]
depends = ["menu"]
"#,
        "which no other group provides",
    );
}

#[test]
fn test_overlapping_groups_return_config_error() {
    expect_config_error(
        r#"
[portal.1]
name = "P"
plugin = "demo"

[plugin.demo.group.a]
provides = ["menu", "credit"]

[plugin.demo.group.b]
provides = ["credit"]
"#,
        "already provided by group 'a'",
    );
}

#[test]
fn test_unknown_task_name_returns_config_error() {
    expect_config_error(
        r#"
[portal.1]
name = "P"
plugin = "demo"

[plugin.demo.group.a]
provides = ["lunch"]
"#,
        "unknown sync task: lunch",
    );
}

#[test]
fn test_unknown_plugin_returns_config_error() {
    expect_config_error(
        r#"
[portal.1]
name = "P"
plugin = "missing"
"#,
        "uses unknown plugin 'missing'",
    );
}

#[test]
fn test_missing_portals_return_config_error() {
    expect_config_error(
        r#"
[sync]
plugin_timeout = 5
"#,
        "at least one [portal.<id>]",
    );
}

#[test]
fn test_zero_timeout_returns_config_error() {
    expect_config_error(
        r#"
[sync]
plugin_timeout = 0

[portal.1]
name = "P"
plugin = "demo"

[plugin.demo]
"#,
        "plugin_timeout must be >= 1 second",
    );
}

#[test]
fn test_bad_ids_and_references_return_config_error() {
    expect_config_error(
        r#"
[portal.first]
name = "P"
plugin = "demo"

[plugin.demo]
"#,
        "invalid portal id 'first'",
    );

    expect_config_error(
        r#"
[portal.1]
name = "P"
plugin = "demo"

[credential.10]
portal = 2
group = 1
user = 1

[plugin.demo]
"#,
        "credential 10 refers to unknown portal 2",
    );
}

#[test]
fn test_unknown_feature_returns_config_error() {
    expect_config_error(
        r#"
[portal.1]
name = "P"
plugin = "demo"
features = ["free_lunch"]

[plugin.demo]
"#,
        "unknown portal feature: free_lunch",
    );
}

#[test]
fn test_bad_format_pattern_returns_config_error() {
    expect_config_error(
        r#"
[portal.1]
name = "P"
plugin = "demo"

[[plugin.demo.portal_format]]
code = "url"
name = "Address"
pattern = "(unclosed"
"#,
        "invalid pattern",
    );
}

#[test]
fn test_missing_file_and_bad_toml() {
    match load_and_validate("/definitely/not/here/Menusync.toml") {
        Err(SyncError::IoError(_)) => {}
        Err(e) => panic!("Expected IoError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }

    match load("[portal.1\nname = ") {
        Err(SyncError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}
