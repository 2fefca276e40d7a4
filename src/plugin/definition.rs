// src/plugin/definition.rs

use std::fmt;
use std::sync::Arc;

use crate::contract::{ExtraFormat, SessionOutcome, TaskFlags, TestResult};
use crate::errors::Result;
use crate::groups::{SessionContext, TaskGroup, TaskGroupRegistry};
use crate::plugin::executor::PluginExecutor;
use crate::plugin::hooks::{NoopHooks, PortalTester, SessionHooks};
use crate::types::PluginId;

/// A plugin: task groups for sync plus the capability side channels.
pub struct Plugin {
    id: PluginId,
    executor: PluginExecutor,
    tester: Arc<dyn PortalTester>,
    portal_formats: Vec<ExtraFormat>,
    credential_formats: Vec<ExtraFormat>,
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("supported", &self.supported_tasks())
            .finish_non_exhaustive()
    }
}

impl Plugin {
    pub fn builder(id: impl Into<PluginId>) -> PluginBuilder {
        PluginBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn supported_tasks(&self) -> TaskFlags {
        self.executor.supported_tasks()
    }

    pub fn executor(&self) -> &PluginExecutor {
        &self.executor
    }

    pub fn sync(&self, ctx: &SessionContext, tasks: TaskFlags) -> Result<SessionOutcome> {
        self.executor.execute(ctx, tasks)
    }

    pub fn test_portal(&self, ctx: &SessionContext) -> TestResult {
        self.tester.test_portal(ctx)
    }

    pub fn portal_formats(&self) -> &[ExtraFormat] {
        &self.portal_formats
    }

    pub fn credential_formats(&self) -> &[ExtraFormat] {
        &self.credential_formats
    }
}

/// Builder for [`Plugin`].
///
/// Group registration errors (two groups providing the same task) surface
/// from [`PluginBuilder::build`].
pub struct PluginBuilder {
    id: PluginId,
    groups: Vec<Arc<dyn TaskGroup>>,
    hooks: Arc<dyn SessionHooks>,
    tester: Arc<dyn PortalTester>,
    portal_formats: Vec<ExtraFormat>,
    credential_formats: Vec<ExtraFormat>,
}

impl PluginBuilder {
    pub fn new(id: impl Into<PluginId>) -> Self {
        Self {
            id: id.into(),
            groups: Vec::new(),
            hooks: Arc::new(NoopHooks),
            tester: Arc::new(TestResult::Ok),
            portal_formats: Vec::new(),
            credential_formats: Vec::new(),
        }
    }

    pub fn group(mut self, group: Arc<dyn TaskGroup>) -> Self {
        self.groups.push(group);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn portal_tester(mut self, tester: Arc<dyn PortalTester>) -> Self {
        self.tester = tester;
        self
    }

    pub fn portal_format(mut self, format: ExtraFormat) -> Self {
        self.portal_formats.push(format);
        self
    }

    pub fn credential_format(mut self, format: ExtraFormat) -> Self {
        self.credential_formats.push(format);
        self
    }

    /// Fails on overlapping groups or a cycle between groups.
    pub fn build(self) -> Result<Plugin> {
        let mut registry = TaskGroupRegistry::new();
        for group in self.groups {
            registry.register(group)?;
        }

        let executor = PluginExecutor::new(registry, self.hooks);
        executor.graph().check_acyclic()?;

        Ok(Plugin {
            id: self.id,
            executor,
            tester: self.tester,
            portal_formats: self.portal_formats,
            credential_formats: self.credential_formats,
        })
    }
}
