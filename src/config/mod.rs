// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`]: the TOML data model, raw and validated.
//! - [`loader`]: reading a config file from disk.
//! - [`validate`]: turning a raw config into a [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{
    ConfigFile, CredentialConfig, GroupConfig, GroupOutcome, GroupSettings, PluginConfig,
    PluginSettings, PortalConfig, PortalSettings, RawConfigFile, SyncSection, SyncSettings,
};
