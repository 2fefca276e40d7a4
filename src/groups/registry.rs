// src/groups/registry.rs

use std::sync::Arc;

use tracing::debug;

use crate::contract::TaskFlags;
use crate::errors::{Result, SyncError};
use crate::groups::TaskGroup;

/// The task groups of one plugin, in registration order.
///
/// Registration order has no influence on execution order. Every task flag
/// is provided by at most one group.
#[derive(Debug, Default, Clone)]
pub struct TaskGroupRegistry {
    groups: Vec<Arc<dyn TaskGroup>>,
}

impl TaskGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, group: Arc<dyn TaskGroup>) -> Result<()> {
        let provides = group.provides();

        if provides.is_empty() {
            return Err(SyncError::ConfigError(format!(
                "task group '{}' provides no task",
                group.name()
            )));
        }

        for existing in &self.groups {
            if existing.name() == group.name() {
                return Err(SyncError::ConfigError(format!(
                    "task group '{}' registered twice",
                    group.name()
                )));
            }
            let overlap = existing.provides() & provides;
            if !overlap.is_empty() {
                return Err(SyncError::ConfigError(format!(
                    "task group '{}' provides {} which is already provided by '{}'",
                    group.name(),
                    overlap,
                    existing.name()
                )));
            }
        }

        debug!(
            group = group.name(),
            provides = %provides,
            depends = %group.depends(),
            "registered task group"
        );
        self.groups.push(group);
        Ok(())
    }

    /// Union of everything the registered groups provide.
    pub fn supported(&self) -> TaskFlags {
        self.groups.iter().map(|g| g.provides()).collect()
    }

    /// Index of the group providing `task` (a single bit).
    pub fn provider_of(&self, task: TaskFlags) -> Option<usize> {
        self.groups.iter().position(|g| g.provides().contains(task))
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn TaskGroup>> {
        self.groups.get(index)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TaskGroup>> {
        self.groups.iter()
    }
}
