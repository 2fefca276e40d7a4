// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::{CredentialId, PortalId, SyncAction, UserId};

/// Command-line arguments for `menusync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "menusync",
    version,
    about = "Sync canteen menus, orders and credit through portal plugins.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Menusync.toml` in the current working directory.
    #[arg(long, global = true, value_name = "PATH", default_value = "Menusync.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MENUSYNC_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run one sync pass over every configured (portal, credential) pair
    Sync(PassArgs),

    /// Print the tasks each pair would be asked for, without syncing
    Plan(PassArgs),

    /// Ask the plugin of a portal whether its portal data is valid
    TestPortal {
        #[arg(value_name = "PORTAL_ID")]
        portal: PortalId,

        /// Credential to test with (default: the first one of the portal)
        #[arg(long, value_name = "ID")]
        credential: Option<CredentialId>,
    },

    /// Print the extra form fields of a plugin as JSON
    Formats {
        #[arg(value_name = "PLUGIN")]
        plugin: String,

        #[arg(long, value_enum, default_value = "portal")]
        kind: FormatKind,
    },
}

/// Arguments shared by `sync` and `plan`.
#[derive(Debug, Clone, clap::Args)]
pub struct PassArgs {
    /// Kind of pass: full, changes or remaining.
    #[arg(long, default_value = "full")]
    pub action: SyncAction,

    /// Restrict the pass to one user's credentials (required for `remaining`).
    #[arg(long, value_name = "ID")]
    pub user: Option<UserId>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FormatKind {
    Portal,
    Credential,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
