// src/plugin/registry.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, SyncError};
use crate::plugin::Plugin;
use crate::types::PluginId;

/// Registered plugin plus its job id.
#[derive(Debug, Clone)]
struct Entry {
    plugin: Arc<Plugin>,
    job_id: u32,
}

/// Plugins known to the coordinator, addressed by id.
///
/// Each plugin gets a job id on registration, counting up from zero in
/// registration order. Job ids stay stable for the lifetime of the registry.
#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    plugins: BTreeMap<PluginId, Entry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin and return its job id.
    pub fn register(&mut self, plugin: Plugin) -> Result<u32> {
        let id = plugin.id().to_string();
        if self.plugins.contains_key(&id) {
            return Err(SyncError::ConfigError(format!(
                "plugin '{id}' registered twice"
            )));
        }

        let job_id = u32::try_from(self.plugins.len()).map_err(|_| {
            SyncError::ConfigError("too many plugins registered".to_string())
        })?;
        debug!(plugin = %id, job_id, supported = %plugin.supported_tasks(), "registered plugin");

        self.plugins.insert(
            id,
            Entry {
                plugin: Arc::new(plugin),
                job_id,
            },
        );
        Ok(job_id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Plugin>> {
        self.plugins.get(id).map(|e| Arc::clone(&e.plugin))
    }

    pub fn lookup(&self, id: &str) -> Result<Arc<Plugin>> {
        self.get(id)
            .ok_or_else(|| SyncError::UnknownPlugin(id.to_string()))
    }

    pub fn job_id(&self, id: &str) -> Option<u32> {
        self.plugins.get(id).map(|e| e.job_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
