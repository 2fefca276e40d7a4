// src/groups/mod.rs

//! Task groups and their dependency resolution.
//!
//! - [`group`] defines the [`TaskGroup`] trait and task failures.
//! - [`registry`] holds the groups of one plugin.
//! - [`graph`] derives provider/dependent edges from task flags.
//! - [`resolver`] is the per-session state machine deciding what runs next.
//! - [`state`] defines per-session group states.

pub mod graph;
pub mod group;
pub mod registry;
pub mod resolver;
pub mod state;

pub use graph::GroupGraph;
pub use group::{SessionContext, TaskFailure, TaskGroup};
pub use registry::TaskGroupRegistry;
pub use resolver::Resolver;
pub use state::{GroupRunState, ResolverStep};
