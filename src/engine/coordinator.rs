// src/engine/coordinator.rs

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::contract::{SyncReply, SyncRequest, SyncResult, TaskFlags};
use crate::engine::aggregate::{Observation, ReplyStatus, SessionKey, SyncAggregate};
use crate::engine::events::{EventBus, SyncEvent};
use crate::engine::planner::{plan_sync, SyncPlan};
use crate::errors::{Result, SyncError};
use crate::exec::PluginBackend;
use crate::store::{RepairReport, SyncStore};
use crate::types::SyncScope;

/// Summary of one finished sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub worst: SyncResult,
    /// Pairs in scope.
    pub in_scope: usize,
    pub dispatched: usize,
    pub skipped: usize,
    pub replied: usize,
    pub timed_out: bool,
    /// `None` when the portals could not be reached and local state was left
    /// alone.
    pub repair: Option<RepairReport>,
}

impl SyncSummary {
    /// Whether the pass is reported as a success to the user.
    pub fn is_success(&self) -> bool {
        self.worst <= SyncResult::Ok
    }
}

/// Host side of the sync protocol: fans requests out to plugins and folds
/// their replies.
///
/// Each pass creates its own reply channel. The coordinator alone owns the
/// receiving end and drops it when the pass ends, so replies arriving after
/// that are discarded by the sender.
pub struct SyncCoordinator<B: PluginBackend> {
    backend: B,
    store: Arc<dyn SyncStore>,
    events: EventBus,
    plugin_timeout: Duration,
}

impl<B: PluginBackend> std::fmt::Debug for SyncCoordinator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("store", &self.store)
            .field("plugin_timeout", &self.plugin_timeout)
            .finish_non_exhaustive()
    }
}

impl<B: PluginBackend> SyncCoordinator<B> {
    pub fn new(backend: B, store: Arc<dyn SyncStore>, plugin_timeout: Duration) -> Self {
        Self {
            backend,
            store,
            events: EventBus::new(),
            plugin_timeout,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Compute the pass without contacting any plugin.
    pub fn plan(&self, filter: TaskFlags, scope: SyncScope) -> Result<SyncPlan> {
        let rows = self.store.sync_rows(scope)?;
        Ok(plan_sync(&rows, filter))
    }

    /// Run one sync pass.
    ///
    /// Errors are local configuration errors (a plugin forging
    /// `PluginTimeout`, using an unknown result code or unable to run a
    /// session at all) and store failures.
    /// `Finished` is published in every case.
    pub async fn run_sync(&self, filter: TaskFlags, scope: SyncScope) -> Result<SyncSummary> {
        info!(tasks = %filter, ?scope, "sync pass started");
        self.events.publish(SyncEvent::Started { tasks: filter });

        let mut aggregate = SyncAggregate::new(0);
        let result = self.run_pass(filter, scope, &mut aggregate).await;

        let worst = aggregate.worst();
        self.events.publish(SyncEvent::Finished { worst });

        match &result {
            Ok(summary) => info!(
                worst = %summary.worst,
                dispatched = summary.dispatched,
                replied = summary.replied,
                timed_out = summary.timed_out,
                "sync pass finished"
            ),
            Err(err) => error!(error = %err, worst = %worst, "sync pass aborted"),
        }

        result
    }

    async fn run_pass(
        &self,
        filter: TaskFlags,
        scope: SyncScope,
        aggregate: &mut SyncAggregate,
    ) -> Result<SyncSummary> {
        let plan = self.plan(filter, scope)?;
        *aggregate = SyncAggregate::new(plan.in_scope());

        for row in &plan.skipped {
            info!(
                portal_id = row.portal_id,
                credential_id = row.credential_id,
                "nothing to sync for pair; skipping"
            );
            aggregate.mark_skipped();
        }

        let (reply_tx, mut reply_rx) = mpsc::channel::<SyncReply>(plan.sessions.len().max(1));
        let deadline = Instant::now() + self.plugin_timeout;

        for session in &plan.sessions {
            let row = &session.row;
            aggregate.expect(
                (row.portal_id, row.credential_id),
                row.credit,
                self.store.last_menu_date(row.portal_id)?,
            );
        }

        for session in &plan.sessions {
            let request = SyncRequest {
                plugin: session.row.plugin.clone(),
                portal_id: session.row.portal_id,
                credential_id: session.row.credential_id,
                tasks: session.tasks,
            };
            let key = (request.portal_id, request.credential_id);

            if let Err(err) = self.backend.dispatch(request, reply_tx.clone()).await {
                warn!(
                    portal_id = key.0,
                    credential_id = key.1,
                    error = %err,
                    "dispatch failed; counting pair as I/O failure"
                );
                self.fold(aggregate, key, SyncResult::IoException)?;
            }
        }

        // Only in-flight sessions hold senders from here on.
        drop(reply_tx);

        while !aggregate.is_complete() {
            match timeout_at(deadline, reply_rx.recv()).await {
                Ok(Some(reply)) => self.handle_reply(aggregate, reply)?,
                Ok(None) => {
                    warn!(
                        remaining = aggregate.remaining(),
                        "every session dropped its reply channel without answering"
                    );
                    aggregate.expire();
                }
                Err(_) => {
                    let missing = aggregate.expire();
                    warn!(
                        timeout = ?self.plugin_timeout,
                        ?missing,
                        "plugin timeout elapsed"
                    );
                }
            }
        }

        // Late replies now fail to send and are discarded.
        drop(reply_rx);

        let worst = aggregate.worst();
        let repair = if worst.is_connection_failure() {
            info!(worst = %worst, "portals unreachable; skipping local repair");
            None
        } else {
            let report = self.store.repair_actions()?;
            self.store.set_last_sync(SystemTime::now())?;
            Some(report)
        };

        Ok(SyncSummary {
            worst,
            in_scope: plan.in_scope(),
            dispatched: plan.sessions.len(),
            skipped: plan.skipped.len(),
            replied: aggregate.replied(),
            timed_out: aggregate.timed_out(),
            repair,
        })
    }

    fn handle_reply(&self, aggregate: &mut SyncAggregate, reply: SyncReply) -> Result<()> {
        let key = (reply.portal_id, reply.credential_id);

        if let Some(message) = &reply.fatal_error {
            error!(
                portal_id = key.0,
                credential_id = key.1,
                message = %message,
                "plugin could not run the session"
            );
            return Err(SyncError::PluginFailed {
                portal_id: key.0,
                credential_id: key.1,
                message: message.clone(),
            });
        }

        let scalar = reply.worst()?;
        let worst = reply.session_worst()?;
        if worst != scalar {
            warn!(
                portal_id = key.0,
                credential_id = key.1,
                reported = %scalar,
                per_task = %worst,
                "reply worst result understates its task results"
            );
        }

        for (task, result) in reply.task_results()? {
            if result == SyncResult::PluginTimeout {
                return Err(SyncError::ForgedTimeout {
                    portal_id: key.0,
                    credential_id: key.1,
                });
            }
            debug!(
                portal_id = key.0,
                credential_id = key.1,
                task = %task,
                result = %result,
                "task result"
            );
        }

        if let Some(message) = &reply.error_message {
            warn!(
                portal_id = key.0,
                credential_id = key.1,
                worst = %worst,
                message = %message,
                "plugin reported an error"
            );
        }

        self.fold(aggregate, key, worst)
    }

    fn fold(&self, aggregate: &mut SyncAggregate, key: SessionKey, worst: SyncResult) -> Result<()> {
        let observed = Observation {
            credit: self.store.current_credit(key.1)?,
            last_menu_date: self.store.last_menu_date(key.0)?,
        };

        if let ReplyStatus::Accepted { events } = aggregate.record_reply(key, worst, observed)? {
            for event in events {
                info!(?event, "change detected");
                self.events.publish(event);
            }
        }
        Ok(())
    }
}
