// src/contract/outcome.rs

use std::collections::BTreeMap;

use crate::contract::{SyncResult, TaskFlags};

/// Per-task results of one plugin session.
///
/// Keys are single-bit [`TaskFlags`]; every requested bit ends up with
/// exactly one entry and bits that were not requested never appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutcome {
    results: BTreeMap<TaskFlags, SyncResult>,
    error_message: Option<String>,
}

impl SessionOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `result` for every single bit of `tasks`.
    ///
    /// A bit that already has a result keeps it; the first decision about a
    /// task is final for the session.
    pub fn record(&mut self, tasks: TaskFlags, result: SyncResult) {
        for bit in tasks.iter() {
            self.results.entry(bit).or_insert(result);
        }
    }

    /// Keep the first error message of the session.
    pub fn note_error(&mut self, message: impl Into<String>) {
        if self.error_message.is_none() {
            self.error_message = Some(message.into());
        }
    }

    pub fn get(&self, task: TaskFlags) -> Option<SyncResult> {
        self.results.get(&task).copied()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Union of all bits that have a result.
    pub fn tasks(&self) -> TaskFlags {
        self.results.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskFlags, SyncResult)> + '_ {
        self.results.iter().map(|(task, result)| (*task, *result))
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Worst per-task result, `NotSupported` when nothing was recorded.
    pub fn worst(&self) -> SyncResult {
        SyncResult::worst_of(self.results.values().copied())
    }
}
