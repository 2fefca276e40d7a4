// src/exec/backend.rs

//! Pluggable dispatch backend.
//!
//! The coordinator talks to a `PluginBackend` instead of calling plugins
//! directly. A backend takes a [`SyncRequest`] and, at some later point,
//! sends exactly one [`SyncReply`] for it on the given channel.
//!
//! - [`LocalPluginBackend`](crate::exec::LocalPluginBackend) runs in-process
//!   plugins from a [`PluginRegistry`](crate::plugin::PluginRegistry).
//! - Tests provide their own backend that replies with canned results,
//!   late, or not at all.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::contract::{SyncReply, SyncRequest};
use crate::errors::Result;

/// Trait abstracting how sync requests reach plugins.
pub trait PluginBackend: Send + Sync {
    /// Hand `request` to its plugin.
    ///
    /// The returned future resolves once the request is on its way, not when
    /// the reply arrives. The reply goes to `reply_tx`; a send error means the
    /// pass already finished and the reply is discarded.
    fn dispatch(
        &self,
        request: SyncRequest,
        reply_tx: mpsc::Sender<SyncReply>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
