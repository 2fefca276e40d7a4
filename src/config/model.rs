// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::contract::{ExtraFormat, TaskFlags, TestResult};
use crate::groups::TaskFailure;
use crate::types::{CredentialGroupId, CredentialId, PluginId, PortalFeatures, PortalId, SyncAction, UserId};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [sync]
/// plugin_timeout = 60
///
/// [portal.1]
/// name = "School canteen"
/// plugin = "demo"
/// features = ["group_full_sync"]
///
/// [credential.10]
/// portal = 1
/// group = 1
/// user = 1
///
/// [plugin.demo.group.menu]
/// provides = ["menu", "group_menu"]
///
/// [plugin.demo.group.history]
/// provides = ["action_history", "credit"]
/// depends = ["menu"]
/// ```
///
/// Table keys are strings in TOML; ids are parsed during validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub portal: BTreeMap<String, PortalConfig>,

    #[serde(default)]
    pub credential: BTreeMap<String, CredentialConfig>,

    #[serde(default)]
    pub plugin: BTreeMap<String, PluginConfig>,
}

/// `[sync]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSection {
    /// How long a pass waits for plugin replies, in seconds.
    #[serde(default = "default_plugin_timeout")]
    pub plugin_timeout: u64,

    /// Override of the task filter of a "changes" pass.
    #[serde(default)]
    pub changes_tasks: Option<Vec<String>>,

    /// Override of the task filter of a "remaining" pass.
    #[serde(default)]
    pub remaining_tasks: Option<Vec<String>>,
}

fn default_plugin_timeout() -> u64 {
    60
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            plugin_timeout: default_plugin_timeout(),
            changes_tasks: None,
            remaining_tasks: None,
        }
    }
}

/// `[portal.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    pub name: String,
    pub plugin: PluginId,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub last_menu_date: Option<i64>,
}

/// `[credential.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    pub portal: PortalId,
    pub group: CredentialGroupId,
    pub user: UserId,
    #[serde(default)]
    pub credit: Option<i64>,
}

/// `[plugin.<id>]` section of a config-driven plugin.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PluginConfig {
    #[serde(default)]
    pub portal_test: TestResult,

    #[serde(default)]
    pub portal_format: Vec<ExtraFormat>,

    #[serde(default)]
    pub credential_format: Vec<ExtraFormat>,

    /// Task groups keyed by group name.
    #[serde(default)]
    pub group: BTreeMap<String, GroupConfig>,
}

/// `[plugin.<id>.group.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub provides: Vec<String>,

    #[serde(default)]
    pub depends: Vec<String>,

    /// What every run of this group reports.
    #[serde(default)]
    pub outcome: GroupOutcome,

    /// Simulated portal latency.
    #[serde(default)]
    pub delay_ms: u64,

    /// Credit written for the credential when the group syncs credit.
    #[serde(default)]
    pub credit: Option<i64>,

    /// Menu date written for the portal when the group syncs the menu.
    #[serde(default)]
    pub menu_date: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOutcome {
    #[default]
    Ok,
    WrongCredentials,
    FormatChanged,
    Maintenance,
    Io,
}

impl GroupOutcome {
    pub fn failure(self, group: &str) -> Option<TaskFailure> {
        let message = format!("configured outcome of group '{group}'");
        match self {
            GroupOutcome::Ok => None,
            GroupOutcome::WrongCredentials => Some(TaskFailure::WrongCredentials(message)),
            GroupOutcome::FormatChanged => Some(TaskFailure::FormatChanged(message)),
            GroupOutcome::Maintenance => Some(TaskFailure::Maintenance(message)),
            GroupOutcome::Io => Some(TaskFailure::Io(message)),
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub sync: SyncSettings,
    pub portals: BTreeMap<PortalId, PortalSettings>,
    pub credentials: BTreeMap<CredentialId, CredentialConfig>,
    pub plugins: BTreeMap<PluginId, PluginSettings>,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub plugin_timeout: Duration,
    pub changes_tasks: TaskFlags,
    pub remaining_tasks: TaskFlags,
}

impl SyncSettings {
    /// Task filter of a pass of the given kind.
    pub fn filter_for(&self, action: SyncAction) -> TaskFlags {
        match action {
            SyncAction::Full => SyncAction::Full.default_filter(),
            SyncAction::Changes => self.changes_tasks,
            SyncAction::Remaining => self.remaining_tasks,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            plugin_timeout: Duration::from_secs(default_plugin_timeout()),
            changes_tasks: SyncAction::Changes.default_filter(),
            remaining_tasks: SyncAction::Remaining.default_filter(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortalSettings {
    pub name: String,
    pub plugin: PluginId,
    pub features: PortalFeatures,
    pub last_menu_date: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PluginSettings {
    pub portal_test: TestResult,
    pub portal_formats: Vec<ExtraFormat>,
    pub credential_formats: Vec<ExtraFormat>,
    pub groups: Vec<GroupSettings>,
}

#[derive(Debug, Clone)]
pub struct GroupSettings {
    pub name: String,
    pub provides: TaskFlags,
    pub depends: TaskFlags,
    pub failure: Option<TaskFailure>,
    pub delay: Duration,
    pub credit: Option<i64>,
    pub menu_date: Option<i64>,
}
