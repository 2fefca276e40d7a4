#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use menusync::contract::TaskFlags;
use menusync::groups::{SessionContext, TaskFailure, TaskGroup};
use menusync::plugin::SessionHooks;

/// Shared, ordered log of what ran: group names plus `start` / `end`.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A task group that:
/// - counts its runs
/// - records the `tasks` it was handed
/// - optionally fails with a fixed failure
pub struct CountingGroup {
    name: String,
    provides: TaskFlags,
    depends: TaskFlags,
    failure: Option<TaskFailure>,
    runs: AtomicUsize,
    seen: Mutex<Vec<TaskFlags>>,
    log: Option<CallLog>,
}

impl CountingGroup {
    pub fn new(name: &str, provides: TaskFlags) -> Self {
        Self {
            name: name.to_string(),
            provides,
            depends: TaskFlags::empty(),
            failure: None,
            runs: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            log: None,
        }
    }

    pub fn after(mut self, depends: TaskFlags) -> Self {
        self.depends = depends;
        self
    }

    pub fn failing(mut self, failure: TaskFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn logging_to(mut self, log: &CallLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn seen_tasks(&self) -> Vec<TaskFlags> {
        self.seen.lock().unwrap().clone()
    }
}

impl TaskGroup for CountingGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn provides(&self) -> TaskFlags {
        self.provides
    }

    fn depends(&self) -> TaskFlags {
        self.depends
    }

    fn run(&self, _ctx: &SessionContext, tasks: TaskFlags) -> Result<(), TaskFailure> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(tasks);
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

/// Session hooks counting their calls.
#[derive(Default)]
pub struct CountingHooks {
    starts: AtomicUsize,
    ends: AtomicUsize,
    start_failure: Option<TaskFailure>,
    end_failure: Option<TaskFailure>,
    log: Option<CallLog>,
}

impl CountingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_start(mut self, failure: TaskFailure) -> Self {
        self.start_failure = Some(failure);
        self
    }

    pub fn failing_end(mut self, failure: TaskFailure) -> Self {
        self.end_failure = Some(failure);
        self
    }

    pub fn logging_to(mut self, log: &CallLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }

    fn note(&self, entry: &str) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(entry.to_string());
        }
    }
}

impl SessionHooks for CountingHooks {
    fn on_session_start(&self, _ctx: &SessionContext) -> Result<(), TaskFailure> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.note("start");
        match &self.start_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn on_session_end(&self, _ctx: &SessionContext) -> Result<(), TaskFailure> {
        self.ends.fetch_add(1, Ordering::SeqCst);
        self.note("end");
        match &self.end_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

/// A context for sessions that never touch a real portal.
pub fn ctx(portal_id: i64, credential_id: i64) -> SessionContext {
    SessionContext {
        plugin: "test".to_string(),
        portal_id,
        credential_id,
    }
}
