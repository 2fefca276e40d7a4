// src/plugin/scripted.rs

//! Plugins whose task groups are described in the config file.
//!
//! A scripted group does no network work: it waits `delay_ms`, then either
//! reports its configured failure or writes its configured credit / menu
//! date into the store.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::{GroupSettings, PluginSettings};
use crate::contract::TaskFlags;
use crate::errors::Result;
use crate::groups::{SessionContext, TaskFailure, TaskGroup};
use crate::plugin::Plugin;
use crate::store::SyncStore;

/// Build a [`Plugin`] from its config section.
pub fn build_scripted_plugin(
    id: &str,
    settings: &PluginSettings,
    store: Arc<dyn SyncStore>,
) -> Result<Plugin> {
    let mut builder = Plugin::builder(id).portal_tester(Arc::new(settings.portal_test));

    for group in &settings.groups {
        builder = builder.group(Arc::new(ScriptedGroup::new(group.clone(), Arc::clone(&store))));
    }
    for format in &settings.portal_formats {
        builder = builder.portal_format(format.clone());
    }
    for format in &settings.credential_formats {
        builder = builder.credential_format(format.clone());
    }

    builder.build()
}

#[derive(Debug)]
pub struct ScriptedGroup {
    settings: GroupSettings,
    store: Arc<dyn SyncStore>,
}

impl ScriptedGroup {
    pub fn new(settings: GroupSettings, store: Arc<dyn SyncStore>) -> Self {
        Self { settings, store }
    }

    fn apply_side_effects(&self, ctx: &SessionContext, tasks: TaskFlags) -> Result<()> {
        if tasks.contains(TaskFlags::CREDIT_SYNC) {
            if let Some(credit) = self.settings.credit {
                self.store.set_credit(ctx.credential_id, credit)?;
            }
        }
        if tasks.contains(TaskFlags::MENU_SYNC) {
            if let Some(date) = self.settings.menu_date {
                self.store.set_last_menu_date(ctx.portal_id, date)?;
            }
        }
        Ok(())
    }
}

impl TaskGroup for ScriptedGroup {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn provides(&self) -> TaskFlags {
        self.settings.provides
    }

    fn depends(&self) -> TaskFlags {
        self.settings.depends
    }

    fn run(&self, ctx: &SessionContext, tasks: TaskFlags) -> std::result::Result<(), TaskFailure> {
        if self.settings.delay > Duration::ZERO {
            std::thread::sleep(self.settings.delay);
        }

        if let Some(failure) = &self.settings.failure {
            return Err(failure.clone());
        }

        self.apply_side_effects(ctx, tasks)
            .map_err(|e| TaskFailure::Io(e.to_string()))?;

        debug!(session = %ctx, group = %self.settings.name, tasks = %tasks, "scripted group done");
        Ok(())
    }
}
