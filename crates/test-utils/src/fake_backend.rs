use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use menusync::contract::{SyncReply, SyncRequest, SyncResult, TaskResultEntry};
use menusync::engine::SessionKey;
use menusync::errors::{Result, SyncError};
use menusync::exec::PluginBackend;

/// How the fake answers one (portal, credential) pair.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Reply with `code` for every requested task after `delay`.
    Reply { code: i32, delay: Duration },
    /// Reply with `task_code` for every requested task but claim
    /// `worst_code` as the session's worst result.
    Mismatched { task_code: i32, worst_code: i32 },
    /// Reply that the session could not run at all.
    Fatal(String),
    /// Keep the reply channel open and never answer.
    Silent,
    /// Fail the dispatch itself.
    DispatchError,
}

impl FakeBehavior {
    pub fn ok() -> Self {
        Self::result(SyncResult::Ok)
    }

    pub fn result(result: SyncResult) -> Self {
        Self::code(result.code())
    }

    pub fn code(code: i32) -> Self {
        FakeBehavior::Reply {
            code,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(result: SyncResult, delay: Duration) -> Self {
        FakeBehavior::Reply {
            code: result.code(),
            delay,
        }
    }
}

type Effect = Arc<dyn Fn(&SyncRequest) + Send + Sync>;

/// A fake plugin backend that:
/// - records every request it gets
/// - answers per pair as configured (default: `Ok` right away)
/// - runs an optional side effect right before replying
pub struct FakeBackend {
    behaviors: HashMap<SessionKey, FakeBehavior>,
    fallback: FakeBehavior,
    effect: Option<Effect>,
    requests: Arc<Mutex<Vec<SyncRequest>>>,
    held: Arc<Mutex<Vec<mpsc::Sender<SyncReply>>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            fallback: FakeBehavior::ok(),
            effect: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            held: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with(mut self, portal_id: i64, credential_id: i64, behavior: FakeBehavior) -> Self {
        self.behaviors.insert((portal_id, credential_id), behavior);
        self
    }

    pub fn fallback(mut self, behavior: FakeBehavior) -> Self {
        self.fallback = behavior;
        self
    }

    pub fn on_reply<F>(mut self, effect: F) -> Self
    where
        F: Fn(&SyncRequest) + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }

    /// Handle to the requests seen so far; stays valid after the backend
    /// moved into a coordinator.
    pub fn requests(&self) -> Arc<Mutex<Vec<SyncRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Reply carrying `code` for every requested task.
pub fn reply_with(request: &SyncRequest, code: i32) -> SyncReply {
    SyncReply {
        portal_id: request.portal_id,
        credential_id: request.credential_id,
        results: request
            .tasks
            .iter()
            .map(|task| TaskResultEntry {
                task: task.bits(),
                result: code,
            })
            .collect(),
        worst_result: code,
        error_message: None,
        fatal_error: None,
    }
}

impl PluginBackend for FakeBackend {
    fn dispatch(
        &self,
        request: SyncRequest,
        reply_tx: mpsc::Sender<SyncReply>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let key = (request.portal_id, request.credential_id);
        let behavior = self
            .behaviors
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        self.requests.lock().unwrap().push(request.clone());

        let effect = self.effect.clone();
        let held = Arc::clone(&self.held);

        Box::pin(async move {
            match behavior {
                FakeBehavior::DispatchError => Err(SyncError::Other(anyhow::anyhow!(
                    "fake dispatch failure"
                ))),
                FakeBehavior::Silent => {
                    held.lock().unwrap().push(reply_tx);
                    Ok(())
                }
                FakeBehavior::Reply { code, delay } => {
                    let reply = reply_with(&request, code);
                    spawn_reply(request, reply, delay, effect, reply_tx);
                    Ok(())
                }
                FakeBehavior::Mismatched {
                    task_code,
                    worst_code,
                } => {
                    let mut reply = reply_with(&request, task_code);
                    reply.worst_result = worst_code;
                    spawn_reply(request, reply, Duration::ZERO, effect, reply_tx);
                    Ok(())
                }
                FakeBehavior::Fatal(message) => {
                    let reply = SyncReply::fatal(&request, message);
                    spawn_reply(request, reply, Duration::ZERO, effect, reply_tx);
                    Ok(())
                }
            }
        })
    }
}

fn spawn_reply(
    request: SyncRequest,
    reply: SyncReply,
    delay: Duration,
    effect: Option<Effect>,
    reply_tx: mpsc::Sender<SyncReply>,
) {
    tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(effect) = effect {
            effect(&request);
        }
        // The pass may be over; a late reply is simply dropped.
        let _ = reply_tx.send(reply).await;
    });
}
