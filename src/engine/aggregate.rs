// src/engine/aggregate.rs

//! Pure fan-in state of a sync pass.
//!
//! The aggregate has no channels and does no IO. The coordinator feeds it
//! replies one at a time from a single loop, so it needs no locking.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::contract::SyncResult;
use crate::engine::events::SyncEvent;
use crate::errors::{Result, SyncError};
use crate::types::{CredentialId, PortalId};

/// Identifies one dispatched session.
pub type SessionKey = (PortalId, CredentialId);

/// Store values observed right after a reply arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    pub credit: Option<i64>,
    pub last_menu_date: Option<i64>,
}

/// What happened to a reply handed to [`SyncAggregate::record_reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyStatus {
    /// Folded in; the gate moved by one.
    Accepted { events: Vec<SyncEvent> },
    /// Already answered or never dispatched; ignored.
    Ignored,
}

/// Completion gate, running worst result and change-detection snapshots.
#[derive(Debug)]
pub struct SyncAggregate {
    /// Pairs still owed a reply.
    remaining: usize,
    /// Replies still owed per pair; a pair can be dispatched more than once.
    outstanding: HashMap<SessionKey, usize>,
    worst: SyncResult,
    replied: usize,
    timed_out: bool,
    /// Credit before the pass; `None` once unknown or already reported.
    credit_before: HashMap<CredentialId, Option<i64>>,
    /// Menu date before the pass; `None` once unknown or already reported.
    menu_before: HashMap<PortalId, Option<i64>>,
}

impl SyncAggregate {
    /// Gate covering `in_scope` pairs, skipped ones included.
    pub fn new(in_scope: usize) -> Self {
        Self {
            remaining: in_scope,
            outstanding: HashMap::new(),
            worst: SyncResult::NotSupported,
            replied: 0,
            timed_out: false,
            credit_before: HashMap::new(),
            menu_before: HashMap::new(),
        }
    }

    /// A pair that owes nothing counts as done right away.
    pub fn mark_skipped(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Register a pair about to be dispatched, with the store values before
    /// dispatch. Only the first snapshot per credential and per portal is
    /// kept.
    pub fn expect(&mut self, key: SessionKey, credit: Option<i64>, last_menu_date: Option<i64>) {
        let (portal_id, credential_id) = key;
        *self.outstanding.entry(key).or_insert(0) += 1;
        self.credit_before.entry(credential_id).or_insert(credit);
        self.menu_before.entry(portal_id).or_insert(last_menu_date);
    }

    /// Fold one reply.
    ///
    /// A plugin reporting `PluginTimeout` breaks the protocol and yields
    /// [`SyncError::ForgedTimeout`]; nothing is folded then.
    pub fn record_reply(
        &mut self,
        key: SessionKey,
        worst: SyncResult,
        observed: Observation,
    ) -> Result<ReplyStatus> {
        let (portal_id, credential_id) = key;

        if worst == SyncResult::PluginTimeout {
            return Err(SyncError::ForgedTimeout {
                portal_id,
                credential_id,
            });
        }

        if self.remaining == 0 || !self.take_outstanding(key) {
            warn!(portal_id, credential_id, "unexpected or duplicate reply; ignoring");
            return Ok(ReplyStatus::Ignored);
        }

        self.remaining -= 1;
        self.replied += 1;
        self.worst = self.worst.max(worst);

        let mut events = Vec::new();
        if let Some(event) = self.detect_credit_change(credential_id, observed.credit) {
            events.push(event);
        }
        if let Some(event) = self.detect_new_menu(portal_id, observed.last_menu_date) {
            events.push(event);
        }

        debug!(
            portal_id,
            credential_id,
            result = %worst,
            worst = %self.worst,
            remaining = self.remaining,
            "reply folded"
        );

        Ok(ReplyStatus::Accepted { events })
    }

    /// The deadline passed: close the gate and force `PluginTimeout`.
    ///
    /// Results already folded stay as they are. Returns the pairs that never
    /// replied.
    pub fn expire(&mut self) -> Vec<SessionKey> {
        if self.remaining == 0 {
            return Vec::new();
        }

        let mut missing: Vec<SessionKey> = self
            .outstanding
            .drain()
            .flat_map(|(key, count)| std::iter::repeat_n(key, count))
            .collect();
        missing.sort_unstable();

        info!(
            missing = missing.len(),
            "closing sync pass without all replies"
        );

        self.remaining = 0;
        self.timed_out = true;
        self.worst = self.worst.max(SyncResult::PluginTimeout);
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn replied(&self) -> usize {
        self.replied
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn worst(&self) -> SyncResult {
        self.worst
    }

    fn take_outstanding(&mut self, key: SessionKey) -> bool {
        match self.outstanding.get_mut(&key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.outstanding.remove(&key);
                true
            }
            None => false,
        }
    }

    fn detect_credit_change(&mut self, credential_id: CredentialId, current: Option<i64>) -> Option<SyncEvent> {
        let slot = self.credit_before.get_mut(&credential_id)?;
        let previous = (*slot)?;
        let current = current?;
        if previous == current {
            return None;
        }

        // Report once per pass.
        *slot = None;
        Some(SyncEvent::CreditChanged {
            credential_id,
            previous,
            current,
        })
    }

    fn detect_new_menu(&mut self, portal_id: PortalId, current: Option<i64>) -> Option<SyncEvent> {
        let slot = self.menu_before.get_mut(&portal_id)?;
        let previous = (*slot)?;
        let current = current?;
        if current <= previous {
            return None;
        }

        *slot = None;
        Some(SyncEvent::NewMenu {
            portal_id,
            previous,
            current,
        })
    }
}
