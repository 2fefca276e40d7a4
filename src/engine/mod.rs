// src/engine/mod.rs

//! Host-side orchestration of sync passes.
//!
//! - [`planner`] decides, purely from store rows, which tasks each
//!   (portal, credential) pair owes.
//! - [`aggregate`] is the pure fan-in state: completion gate, worst result,
//!   change detection.
//! - [`coordinator`] is the async shell: it dispatches requests through a
//!   [`PluginBackend`](crate::exec::PluginBackend) and feeds replies into the
//!   aggregate under a deadline.
//! - [`events`] is the notification bus.

pub mod aggregate;
pub mod coordinator;
pub mod events;
pub mod planner;

pub use aggregate::{Observation, ReplyStatus, SessionKey, SyncAggregate};
pub use coordinator::{SyncCoordinator, SyncSummary};
pub use events::{EventBus, SyncEvent};
pub use planner::{owed_tasks, plan_sync, PlannedSession, SyncPlan};
