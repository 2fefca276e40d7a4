// src/exec/local.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::contract::{SyncReply, SyncRequest};
use crate::errors::Result;
use crate::exec::PluginBackend;
use crate::groups::SessionContext;
use crate::plugin::PluginRegistry;

/// Backend running in-process plugins.
///
/// Every request runs on its own blocking task, so sessions of different
/// (portal, credential) pairs proceed in parallel.
#[derive(Debug, Clone)]
pub struct LocalPluginBackend {
    plugins: Arc<PluginRegistry>,
}

impl LocalPluginBackend {
    pub fn new(plugins: Arc<PluginRegistry>) -> Self {
        Self { plugins }
    }
}

impl PluginBackend for LocalPluginBackend {
    fn dispatch(
        &self,
        request: SyncRequest,
        reply_tx: mpsc::Sender<SyncReply>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let plugins = Arc::clone(&self.plugins);

        Box::pin(async move {
            let Some(plugin) = plugins.get(&request.plugin) else {
                warn!(
                    plugin = %request.plugin,
                    portal_id = request.portal_id,
                    "no such plugin; replying not supported"
                );
                let reply = SyncReply::not_supported(
                    &request,
                    format!("plugin '{}' is not installed", request.plugin),
                );
                deliver(reply_tx, reply).await;
                return Ok(());
            };

            info!(
                plugin = %request.plugin,
                job_id = plugins.job_id(&request.plugin),
                portal_id = request.portal_id,
                credential_id = request.credential_id,
                tasks = %request.tasks,
                "dispatching sync request"
            );

            tokio::spawn(async move {
                let ctx = SessionContext {
                    plugin: request.plugin.clone(),
                    portal_id: request.portal_id,
                    credential_id: request.credential_id,
                };
                let tasks = request.tasks;
                let joined =
                    tokio::task::spawn_blocking(move || plugin.sync(&ctx, tasks)).await;

                let reply = match joined {
                    Ok(Ok(outcome)) => SyncReply::from_outcome(&request, &outcome),
                    Ok(Err(err)) => {
                        error!(
                            plugin = %request.plugin,
                            portal_id = request.portal_id,
                            credential_id = request.credential_id,
                            error = %err,
                            "plugin session aborted"
                        );
                        SyncReply::fatal(&request, err.to_string())
                    }
                    Err(join_err) => {
                        error!(
                            plugin = %request.plugin,
                            portal_id = request.portal_id,
                            error = %join_err,
                            "plugin session panicked"
                        );
                        SyncReply::fatal(&request, format!("plugin session panicked: {join_err}"))
                    }
                };

                deliver(reply_tx, reply).await;
            });

            Ok(())
        })
    }
}

async fn deliver(reply_tx: mpsc::Sender<SyncReply>, reply: SyncReply) {
    let portal_id = reply.portal_id;
    let credential_id = reply.credential_id;
    if reply_tx.send(reply).await.is_err() {
        warn!(
            portal_id,
            credential_id,
            "sync pass already finished; late reply discarded"
        );
    } else {
        debug!(portal_id, credential_id, "reply delivered");
    }
}
