// src/plugin/mod.rs

//! Plugin side of the sync protocol.
//!
//! - [`executor`] runs the task groups of one session in dependency order.
//! - [`hooks`] holds the session lifecycle hooks and the portal-test channel.
//! - [`definition`] is the plugin object and its builder.
//! - [`registry`] maps plugin ids to plugins and job ids.
//! - [`scripted`] builds plugins from the config file.

pub mod definition;
pub mod executor;
pub mod hooks;
pub mod registry;
pub mod scripted;

pub use definition::{Plugin, PluginBuilder};
pub use executor::PluginExecutor;
pub use hooks::{NoopHooks, PortalTester, SessionHooks};
pub use registry::PluginRegistry;
pub use scripted::{build_scripted_plugin, ScriptedGroup};
