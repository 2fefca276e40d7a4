#![allow(dead_code)]

use std::collections::BTreeMap;

use menusync::config::{
    ConfigFile, CredentialConfig, GroupConfig, GroupOutcome, PluginConfig, PortalConfig,
    RawConfigFile, SyncSection,
};
use menusync::contract::{ExtraFormat, TestResult};
use menusync::store::memory::{CredentialRecord, PortalRecord};
use menusync::store::{MemoryStore, SyncRow};
use menusync::types::{PortalFeatures, PortalId};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                sync: SyncSection::default(),
                portal: BTreeMap::new(),
                credential: BTreeMap::new(),
                plugin: BTreeMap::new(),
            },
        }
    }

    pub fn plugin_timeout(mut self, secs: u64) -> Self {
        self.config.sync.plugin_timeout = secs;
        self
    }

    pub fn with_portal(mut self, id: PortalId, plugin: &str) -> Self {
        self.config.portal.insert(
            id.to_string(),
            PortalConfig {
                name: format!("portal {id}"),
                plugin: plugin.to_string(),
                features: Vec::new(),
                last_menu_date: None,
            },
        );
        self
    }

    pub fn with_portal_features(mut self, id: PortalId, plugin: &str, features: &[&str]) -> Self {
        self = self.with_portal(id, plugin);
        if let Some(portal) = self.config.portal.get_mut(&id.to_string()) {
            portal.features = features.iter().map(|f| f.to_string()).collect();
        }
        self
    }

    pub fn with_credential(mut self, id: i64, portal: PortalId, group: i64, user: i64) -> Self {
        self.config.credential.insert(
            id.to_string(),
            CredentialConfig {
                portal,
                group,
                user,
                credit: None,
            },
        );
        self
    }

    pub fn with_credit(mut self, credential: i64, credit: i64) -> Self {
        if let Some(c) = self.config.credential.get_mut(&credential.to_string()) {
            c.credit = Some(credit);
        }
        self
    }

    pub fn with_menu_date(mut self, portal: PortalId, date: i64) -> Self {
        if let Some(p) = self.config.portal.get_mut(&portal.to_string()) {
            p.last_menu_date = Some(date);
        }
        self
    }

    pub fn with_plugin(mut self, id: &str, plugin: PluginConfig) -> Self {
        self.config.plugin.insert(id.to_string(), plugin);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PluginConfig`.
pub struct PluginConfigBuilder {
    plugin: PluginConfig,
}

impl PluginConfigBuilder {
    pub fn new() -> Self {
        Self {
            plugin: PluginConfig::default(),
        }
    }

    pub fn group(mut self, name: &str, group: GroupConfig) -> Self {
        self.plugin.group.insert(name.to_string(), group);
        self
    }

    pub fn portal_test(mut self, result: TestResult) -> Self {
        self.plugin.portal_test = result;
        self
    }

    pub fn portal_format(mut self, format: ExtraFormat) -> Self {
        self.plugin.portal_format.push(format);
        self
    }

    pub fn credential_format(mut self, format: ExtraFormat) -> Self {
        self.plugin.credential_format.push(format);
        self
    }

    pub fn build(self) -> PluginConfig {
        self.plugin
    }
}

impl Default for PluginConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `GroupConfig`.
pub struct GroupConfigBuilder {
    group: GroupConfig,
}

impl GroupConfigBuilder {
    pub fn new(provides: &[&str]) -> Self {
        Self {
            group: GroupConfig {
                provides: provides.iter().map(|s| s.to_string()).collect(),
                depends: vec![],
                outcome: GroupOutcome::Ok,
                delay_ms: 0,
                credit: None,
                menu_date: None,
            },
        }
    }

    pub fn after(mut self, flag: &str) -> Self {
        self.group.depends.push(flag.to_string());
        self
    }

    pub fn outcome(mut self, outcome: GroupOutcome) -> Self {
        self.group.outcome = outcome;
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.group.delay_ms = ms;
        self
    }

    pub fn writes_credit(mut self, credit: i64) -> Self {
        self.group.credit = Some(credit);
        self
    }

    pub fn writes_menu_date(mut self, date: i64) -> Self {
        self.group.menu_date = Some(date);
        self
    }

    pub fn build(self) -> GroupConfig {
        self.group
    }
}

/// A store row with the given keys and a placeholder plugin.
pub fn row(portal_id: i64, credential_id: i64, credential_group_id: i64) -> SyncRow {
    SyncRow {
        portal_id,
        credential_id,
        credential_group_id,
        user_id: 1,
        plugin: "fake".to_string(),
        features: PortalFeatures::empty(),
        credit: None,
    }
}

/// Seed a store with one portal per distinct portal id of `rows` and one
/// credential per row.
pub fn store_with_rows(rows: &[SyncRow]) -> MemoryStore {
    let store = MemoryStore::new();
    for r in rows {
        if store.portal(r.portal_id).is_none() {
            store.add_portal(
                r.portal_id,
                PortalRecord {
                    name: format!("portal {}", r.portal_id),
                    plugin: r.plugin.clone(),
                    features: r.features,
                    last_menu_date: None,
                },
            );
        }
        store.add_credential(
            r.credential_id,
            CredentialRecord {
                portal_id: r.portal_id,
                group_id: r.credential_group_id,
                user_id: r.user_id,
                credit: r.credit,
            },
        );
    }
    store
}
