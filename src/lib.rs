// src/lib.rs

pub mod cli;
pub mod config;
pub mod contract;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod groups;
pub mod logging;
pub mod plugin;
pub mod store;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, FormatKind, PassArgs};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::contract::{ExtraFormat, TaskFlags};
use crate::engine::{SyncCoordinator, SyncPlan, SyncSummary};
use crate::exec::LocalPluginBackend;
use crate::groups::SessionContext;
use crate::plugin::{build_scripted_plugin, PluginRegistry};
use crate::store::memory::{CredentialRecord, PortalRecord};
use crate::store::{MemoryStore, SyncStore};
use crate::types::{CredentialId, PortalId, SyncAction, SyncScope};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the store seeded from the config
/// - plugins built from their config sections
/// - the coordinator and its local backend
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let shared: Arc<dyn SyncStore> = Arc::new(build_store(&cfg));
    let plugins = Arc::new(build_plugins(&cfg, Arc::clone(&shared))?);

    match args.command {
        Command::Sync(pass) => {
            let (filter, scope) = pass_filter(&cfg, &pass)?;
            let backend = LocalPluginBackend::new(Arc::clone(&plugins));
            let coordinator = SyncCoordinator::new(backend, shared, cfg.sync.plugin_timeout);

            let summary = coordinator.run_sync(filter, scope).await?;
            print_summary(&summary);

            if !summary.is_success() {
                bail!("sync pass finished with {}", summary.worst);
            }
            Ok(())
        }
        Command::Plan(pass) => {
            let (filter, scope) = pass_filter(&cfg, &pass)?;
            let backend = LocalPluginBackend::new(Arc::clone(&plugins));
            let coordinator = SyncCoordinator::new(backend, shared, cfg.sync.plugin_timeout);

            let plan = coordinator.plan(filter, scope)?;
            print_plan(pass.action, &plan);
            Ok(())
        }
        Command::TestPortal { portal, credential } => {
            test_portal(&cfg, &plugins, portal, credential)
        }
        Command::Formats { plugin, kind } => {
            let plugin = plugins.lookup(&plugin)?;
            let formats = match kind {
                FormatKind::Portal => plugin.portal_formats(),
                FormatKind::Credential => plugin.credential_formats(),
            };
            println!("{}", ExtraFormat::list_to_json(formats)?);
            Ok(())
        }
    }
}

/// Seed an in-memory store with the portals and credentials of a config.
pub fn build_store(cfg: &ConfigFile) -> MemoryStore {
    let store = MemoryStore::new();

    for (portal_id, portal) in &cfg.portals {
        store.add_portal(
            *portal_id,
            PortalRecord {
                name: portal.name.clone(),
                plugin: portal.plugin.clone(),
                features: portal.features,
                last_menu_date: portal.last_menu_date,
            },
        );
    }

    for (credential_id, credential) in &cfg.credentials {
        store.add_credential(
            *credential_id,
            CredentialRecord {
                portal_id: credential.portal,
                group_id: credential.group,
                user_id: credential.user,
                credit: credential.credit,
            },
        );
    }

    debug!(
        portals = cfg.portals.len(),
        credentials = cfg.credentials.len(),
        "store seeded from config"
    );
    store
}

/// Build and register every plugin declared in the config.
///
/// Job ids follow the (sorted) order of plugin ids.
pub fn build_plugins(cfg: &ConfigFile, store: Arc<dyn SyncStore>) -> Result<PluginRegistry> {
    let mut registry = PluginRegistry::new();

    for (id, settings) in &cfg.plugins {
        let plugin = build_scripted_plugin(id, settings, Arc::clone(&store))?;
        let job_id = registry.register(plugin)?;
        info!(plugin = %id, job_id, "plugin ready");
    }

    Ok(registry)
}

fn pass_filter(cfg: &ConfigFile, pass: &PassArgs) -> Result<(TaskFlags, SyncScope)> {
    let scope = match (pass.action, pass.user) {
        (SyncAction::Remaining, None) => {
            bail!("a 'remaining' pass needs --user <ID>");
        }
        (_, Some(user)) => SyncScope::User(user),
        (_, None) => SyncScope::All,
    };
    Ok((cfg.sync.filter_for(pass.action), scope))
}

fn test_portal(
    cfg: &ConfigFile,
    plugins: &PluginRegistry,
    portal_id: PortalId,
    credential: Option<CredentialId>,
) -> Result<()> {
    let portal = cfg
        .portals
        .get(&portal_id)
        .ok_or_else(|| anyhow!("unknown portal {portal_id}"))?;

    let credential_id = match credential {
        Some(id) => id,
        None => cfg
            .credentials
            .iter()
            .find(|(_, c)| c.portal == portal_id)
            .map(|(id, _)| *id)
            .ok_or_else(|| anyhow!("portal {portal_id} has no credential to test with"))?,
    };

    let plugin = plugins.lookup(&portal.plugin)?;
    let ctx = SessionContext {
        plugin: portal.plugin.clone(),
        portal_id,
        credential_id,
    };

    let result = plugin.test_portal(&ctx);
    info!(session = %ctx, ?result, "portal test finished");

    let report = serde_json::json!({
        "portal_id": portal_id,
        "credential_id": credential_id,
        "result": result,
        "code": result.code(),
    });
    println!("{report}");
    Ok(())
}

fn print_plan(action: SyncAction, plan: &SyncPlan) {
    println!("menusync plan ({action:?})");
    println!("  pairs in scope = {}", plan.in_scope());
    println!();

    println!("sessions ({}):", plan.sessions.len());
    for session in &plan.sessions {
        println!(
            "  - portal {} / credential {} via '{}'",
            session.row.portal_id, session.row.credential_id, session.row.plugin
        );
        println!("      tasks: {}", session.tasks);
    }

    if !plan.skipped.is_empty() {
        println!("skipped ({}):", plan.skipped.len());
        for row in &plan.skipped {
            println!("  - portal {} / credential {}", row.portal_id, row.credential_id);
        }
    }

    debug!("plan complete (no plugin contacted)");
}

fn print_summary(summary: &SyncSummary) {
    println!("result: {}", summary.worst);
    println!(
        "  dispatched = {}, skipped = {}, replied = {}, timed out = {}",
        summary.dispatched, summary.skipped, summary.replied, summary.timed_out
    );
    match &summary.repair {
        Some(report) => println!(
            "  repair: {} failed action(s) deleted, {} marked failed, {} synced removed",
            report.deleted_failed, report.marked_failed, report.synced_deleted
        ),
        None => println!("  repair: skipped"),
    }
}
