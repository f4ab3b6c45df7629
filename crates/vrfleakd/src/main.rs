//! vrfleakd - VRF route-leak resolver and leak matrix reconciler
//!
//! Queries and reconciles route-target leaking between VRFs held by the
//! VRF store. Results are printed as JSON on stdout; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sonic_vrfleakd::{
    resolve_visible_prefixes, HttpVrfStore, LeakConfig, LeakMatrix, LeakMgr, MissingCellPolicy,
    ReconcileStatus, VrfSnapshot, DEFAULT_CONFIG_PATH,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code when some operations failed
const EXIT_PARTIAL: u8 = 2;

/// Exit code when the pass was cancelled
const EXIT_CANCELLED: u8 = 3;

#[derive(Debug, Parser)]
#[command(name = "vrfleakd", version, about = "VRF route-leak resolver and reconciler")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the VRF store base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Restrict store snapshots to one namespace
    #[arg(long)]
    namespace: Option<String>,

    /// Maximum concurrent store calls (0 = unbounded)
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Treatment of desired cells absent from the matrix file (remove|keep)
    #[arg(long)]
    missing_cells: Option<MissingCellPolicy>,

    /// Read the VRF snapshot from a JSON file instead of the store
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show prefixes visible in a VRF
    Resolve {
        /// VRF namespace
        namespace: String,
        /// VRF name
        name: String,
    },
    /// Show the current leak matrix
    Matrix,
    /// Show the operations needed to reach a desired matrix
    Diff {
        /// Desired matrix (JSON list of {row, col, leak} cells)
        #[arg(long)]
        desired: PathBuf,
    },
    /// Apply a desired matrix to the store
    Apply {
        /// Desired matrix (JSON list of {row, col, leak} cells)
        #[arg(long)]
        desired: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("vrfleakd: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging.level);

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}

fn load_config(cli: &Cli) -> Result<LeakConfig> {
    let mut config = LeakConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(url) = &cli.base_url {
        config.store.base_url = url.clone();
    }
    if let Some(namespace) = &cli.namespace {
        config.store.namespace = Some(namespace.clone());
    }
    if let Some(max) = cli.max_in_flight {
        config.reconcile.max_in_flight = max;
    }
    if let Some(policy) = cli.missing_cells {
        config.reconcile.missing_cells = policy;
    }

    config.validate()?;
    Ok(config)
}

fn read_snapshot(path: &Path) -> Result<VrfSnapshot> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    VrfSnapshot::from_json(&content).with_context(|| format!("parsing {}", path.display()))
}

fn read_matrix(path: &Path) -> Result<LeakMatrix> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, config: LeakConfig) -> Result<ExitCode> {
    let store = HttpVrfStore::from_config(&config.store)?;
    let mgr = LeakMgr::from_config(store, &config);

    let snapshot = match &cli.snapshot {
        Some(path) => read_snapshot(path)?,
        None => mgr
            .snapshot()
            .await
            .context("fetching VRF snapshot from store")?,
    };
    info!(vrfs = snapshot.len(), "Loaded VRF snapshot");

    match cli.command {
        Command::Resolve { namespace, name } => {
            let visibility = resolve_visible_prefixes(&snapshot, &namespace, &name)?;
            print_json(&visibility)?;
        }
        Command::Matrix => {
            let columns = LeakMatrix::columns(&snapshot);
            let cells = LeakMatrix::current(&snapshot);
            print_json(&serde_json::json!({ "columns": columns, "cells": cells }))?;
        }
        Command::Diff { desired } => {
            let desired = read_matrix(&desired)?;
            print_json(&serde_json::json!({
                "operations": mgr.plan_against(&snapshot, &desired),
                "conflicts": mgr.conflicts_against(&snapshot, &desired),
            }))?;
        }
        Command::Apply { desired } => {
            let desired = read_matrix(&desired)?;
            let ops = mgr.plan_against(&snapshot, &desired);
            info!(operations = ops.len(), "Applying leak matrix");

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling reconciliation");
                    on_signal.cancel();
                }
            });

            let report = mgr.execute(ops, &cancel).await?;
            print_json(&report)?;

            return Ok(match report.status() {
                ReconcileStatus::NoOp | ReconcileStatus::Succeeded => ExitCode::SUCCESS,
                ReconcileStatus::PartiallyFailed => ExitCode::from(EXIT_PARTIAL),
                ReconcileStatus::Failed => ExitCode::FAILURE,
                ReconcileStatus::Cancelled => ExitCode::from(EXIT_CANCELLED),
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}
