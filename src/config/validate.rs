// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{
    ConfigFile, CredentialConfig, GroupSettings, PluginConfig, PluginSettings, PortalSettings,
    RawConfigFile, SyncSettings,
};
use crate::contract::{ExtraFormat, TaskFlags};
use crate::errors::{Result, SyncError};
use crate::groups::GroupGraph;
use crate::types::{CredentialId, PluginId, PortalFeatures, PortalId, SyncAction};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SyncError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_portals(&raw)?;
        let sync = validate_sync_section(&raw)?;
        let plugins = validate_plugins(&raw.plugin)?;
        let portals = validate_portals(&raw, &plugins)?;
        let credentials = validate_credentials(&raw, &portals)?;

        Ok(ConfigFile {
            sync,
            portals,
            credentials,
            plugins,
        })
    }
}

fn ensure_has_portals(cfg: &RawConfigFile) -> Result<()> {
    if cfg.portal.is_empty() {
        return Err(SyncError::ConfigError(
            "config must contain at least one [portal.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_sync_section(cfg: &RawConfigFile) -> Result<SyncSettings> {
    if cfg.sync.plugin_timeout == 0 {
        return Err(SyncError::ConfigError(
            "[sync].plugin_timeout must be >= 1 second (got 0)".to_string(),
        ));
    }

    let changes_tasks = match &cfg.sync.changes_tasks {
        Some(names) => parse_tasks(names, "[sync].changes_tasks")?,
        None => SyncAction::Changes.default_filter(),
    };
    let remaining_tasks = match &cfg.sync.remaining_tasks {
        Some(names) => parse_tasks(names, "[sync].remaining_tasks")?,
        None => SyncAction::Remaining.default_filter(),
    };

    Ok(SyncSettings {
        plugin_timeout: Duration::from_secs(cfg.sync.plugin_timeout),
        changes_tasks,
        remaining_tasks,
    })
}

fn validate_portals(
    cfg: &RawConfigFile,
    plugins: &BTreeMap<PluginId, PluginSettings>,
) -> Result<BTreeMap<PortalId, PortalSettings>> {
    let mut portals = BTreeMap::new();

    for (key, portal) in cfg.portal.iter() {
        let id = parse_id(key, "portal")?;

        if !plugins.contains_key(&portal.plugin) {
            return Err(SyncError::ConfigError(format!(
                "portal {id} uses unknown plugin '{}'",
                portal.plugin
            )));
        }

        let mut features = PortalFeatures::empty();
        for name in portal.features.iter() {
            let feature = name.parse::<PortalFeatures>().map_err(|e| {
                SyncError::ConfigError(format!("portal {id}: {e}"))
            })?;
            features = features.with(feature);
        }

        portals.insert(
            id,
            PortalSettings {
                name: portal.name.clone(),
                plugin: portal.plugin.clone(),
                features,
                last_menu_date: portal.last_menu_date,
            },
        );
    }

    Ok(portals)
}

fn validate_credentials(
    cfg: &RawConfigFile,
    portals: &BTreeMap<PortalId, PortalSettings>,
) -> Result<BTreeMap<CredentialId, CredentialConfig>> {
    let mut credentials = BTreeMap::new();

    for (key, credential) in cfg.credential.iter() {
        let id = parse_id(key, "credential")?;
        if !portals.contains_key(&credential.portal) {
            return Err(SyncError::ConfigError(format!(
                "credential {id} refers to unknown portal {}",
                credential.portal
            )));
        }
        credentials.insert(id, credential.clone());
    }

    Ok(credentials)
}

fn validate_plugins(
    raw: &BTreeMap<String, PluginConfig>,
) -> Result<BTreeMap<PluginId, PluginSettings>> {
    let mut plugins = BTreeMap::new();

    for (id, plugin) in raw.iter() {
        let groups = validate_groups(id, plugin)?;
        validate_formats(id, &plugin.portal_format)?;
        validate_formats(id, &plugin.credential_format)?;

        plugins.insert(
            id.clone(),
            PluginSettings {
                portal_test: plugin.portal_test,
                portal_formats: plugin.portal_format.clone(),
                credential_formats: plugin.credential_format.clone(),
                groups,
            },
        );
    }

    Ok(plugins)
}

fn validate_groups(plugin_id: &str, plugin: &PluginConfig) -> Result<Vec<GroupSettings>> {
    let mut groups: Vec<GroupSettings> = Vec::new();

    for (name, group) in plugin.group.iter() {
        let context = format!("plugin '{plugin_id}' group '{name}'");
        let provides = parse_tasks(&group.provides, &context)?;
        let depends = parse_tasks(&group.depends, &context)?;

        if provides.is_empty() {
            return Err(SyncError::ConfigError(format!(
                "{context} must provide at least one task"
            )));
        }

        if let Some(other) = groups.iter().find(|g| g.provides.intersects(provides)) {
            return Err(SyncError::ConfigError(format!(
                "{context} provides {} which is already provided by group '{}'",
                other.provides & provides,
                other.name
            )));
        }

        groups.push(GroupSettings {
            name: name.clone(),
            provides,
            depends,
            failure: group.outcome.failure(name),
            delay: Duration::from_millis(group.delay_ms),
            credit: group.credit,
            menu_date: group.menu_date,
        });
    }

    let graph = GroupGraph::build(
        groups
            .iter()
            .map(|g| (g.name.as_str(), g.provides, g.depends)),
    );

    for (idx, group) in groups.iter().enumerate() {
        let unprovided = graph.unprovided(idx);
        if !unprovided.is_empty() {
            return Err(SyncError::ConfigError(format!(
                "plugin '{plugin_id}' group '{}' depends on {unprovided} which no other group provides",
                group.name
            )));
        }
    }

    graph.check_acyclic()?;

    Ok(groups)
}

fn validate_formats(plugin_id: &str, formats: &[ExtraFormat]) -> Result<()> {
    for format in formats {
        format.compiled_pattern().map_err(|e| {
            SyncError::ConfigError(format!("plugin '{plugin_id}': {e}"))
        })?;
    }
    Ok(())
}

fn parse_tasks(names: &[String], context: &str) -> Result<TaskFlags> {
    TaskFlags::parse_names(names).map_err(|e| SyncError::ConfigError(format!("{context}: {e}")))
}

fn parse_id(key: &str, kind: &str) -> Result<i64> {
    key.trim().parse::<i64>().map_err(|_| {
        SyncError::ConfigError(format!("invalid {kind} id '{key}' (expected an integer)"))
    })
}
