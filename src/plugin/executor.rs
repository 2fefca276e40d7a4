// src/plugin/executor.rs

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::contract::{SessionOutcome, SyncResult, TaskFlags};
use crate::errors::Result;
use crate::groups::{GroupGraph, Resolver, SessionContext, TaskGroupRegistry};
use crate::plugin::hooks::{SessionGuard, SessionHooks};

/// Runs task groups of one plugin for a single (portal, credential) session.
pub struct PluginExecutor {
    registry: TaskGroupRegistry,
    graph: GroupGraph,
    hooks: Arc<dyn SessionHooks>,
}

impl std::fmt::Debug for PluginExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginExecutor")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl PluginExecutor {
    pub fn new(registry: TaskGroupRegistry, hooks: Arc<dyn SessionHooks>) -> Self {
        let graph = GroupGraph::from_registry(&registry);
        Self {
            registry,
            graph,
            hooks,
        }
    }

    /// Every task some registered group provides.
    pub fn supported_tasks(&self) -> TaskFlags {
        self.registry.supported()
    }

    pub fn graph(&self) -> &GroupGraph {
        &self.graph
    }

    /// Run `requested` against `ctx`.
    ///
    /// Every single bit of `requested` gets exactly one result. Bits no group
    /// provides are `NotSupported`. An empty request returns an empty outcome
    /// and touches neither groups nor hooks.
    ///
    /// Errors are configuration errors of the plugin (a needed group that
    /// can never run); task failures end up in the outcome.
    pub fn execute(&self, ctx: &SessionContext, requested: TaskFlags) -> Result<SessionOutcome> {
        let mut outcome = SessionOutcome::new();
        if requested.is_empty() {
            return Ok(outcome);
        }

        let supported = self.supported_tasks();
        let unsupported = requested.difference(supported);
        let runnable = requested & supported;

        if !unsupported.is_empty() {
            debug!(session = %ctx, tasks = %unsupported, "tasks not supported by plugin");
        }

        if !runnable.is_empty() {
            outcome = self.run_session(ctx, runnable)?;
        }
        outcome.record(unsupported, SyncResult::NotSupported);

        info!(
            session = %ctx,
            requested = %requested,
            worst = %outcome.worst(),
            "plugin session finished"
        );
        Ok(outcome)
    }

    fn run_session(&self, ctx: &SessionContext, requested: TaskFlags) -> Result<SessionOutcome> {
        let mut resolver = Resolver::start(&self.graph, requested)?;

        if let Err(failure) = self.hooks.on_session_start(ctx) {
            warn!(session = %ctx, error = %failure, "session start hook failed");
            resolver.fail_all(&failure);
        }

        let guard = SessionGuard::new(self.hooks.as_ref(), ctx);

        while !resolver.is_finished() {
            let ready = resolver.next_ready();
            if ready.is_empty() {
                return Err(resolver.stalled_error());
            }

            for idx in ready {
                let Some(group) = self.registry.get(idx) else {
                    continue;
                };
                let tasks = resolver.tasks_for(idx);
                debug!(session = %ctx, group = group.name(), tasks = %tasks, "running task group");
                let step = resolver.complete(idx, group.run(ctx, tasks));
                if !step.newly_blocked.is_empty() {
                    debug!(
                        session = %ctx,
                        blocked = ?step.newly_blocked.iter().map(|i| self.graph.name(*i)).collect::<Vec<_>>(),
                        "dependents skipped"
                    );
                }
            }
        }

        let end = guard.finish();
        let mut outcome = resolver.into_outcome();
        if let Err(failure) = end {
            warn!(session = %ctx, error = %failure, "session end hook failed");
            outcome.note_error(failure.to_string());
        }

        Ok(outcome)
    }
}
