// src/exec/mod.rs

//! Plugin dispatch layer.
//!
//! - [`backend`] provides the `PluginBackend` trait the coordinator uses, and
//!   which tests replace with a fake implementation.
//! - [`local`] provides `LocalPluginBackend`, which runs registered
//!   in-process plugins on blocking tasks and replies over a channel.

pub mod backend;
pub mod local;

pub use backend::PluginBackend;
pub use local::LocalPluginBackend;
