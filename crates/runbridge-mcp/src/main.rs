//! `runbridge`: exposes remote apps as MCP tools over stdio.
//!
//! Configuration comes from `runbridge.toml` (searched upward from the
//! working directory) or `RUNBRIDGE_*` environment variables; a `.env` file
//! is loaded first if present.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rmcp::ServiceExt;
use runbridge_client::RunClient;
use runbridge_core::{BridgeConfig, LogFormat};
use runbridge_engine::ExecutionEngine;
use runbridge_mcp::BridgeServer;
use runbridge_registry::RegistryBuilder;
use runbridge_schema::registration_payload;
use runbridge_telemetry::{TelemetryOptions, init_telemetry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "runbridge", version, about = "Expose remote apps as MCP tools")]
struct Cli {
    /// Path to a runbridge.toml file
    #[arg(short, long, env = "RUNBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (logs always go to stderr)
    #[arg(long, value_enum)]
    log_format: Option<LogFormatArg>,

    /// Print the normalized tool definitions as JSON and exit
    #[arg(long)]
    list_tools: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BridgeConfig::load_from(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => BridgeConfig::load().context("Failed to load configuration")?,
    };

    let mut telemetry = TelemetryOptions::from_config(&config.observability);
    if let Some(format) = cli.log_format {
        telemetry = telemetry.with_format(format.into());
    }
    init_telemetry(&telemetry)?;

    if let Err(e) = config.validate() {
        error!(error = %e, "Refusing to start");
        return Err(e.into());
    }

    let client = RunClient::from_config(&config)?;
    info!(base_url = %client.base_url(), "Connecting to remote service");
    let engine = ExecutionEngine::from_config(Arc::new(client), &config);

    let (registry, report) = RegistryBuilder::from_config(engine, &config)
        .discover()
        .await
        .context("Tool discovery failed")?;

    for skipped in &report.skipped {
        warn!(tool = %skipped.tool, reason = %skipped.reason, "Tool not registered");
    }
    if registry.is_empty() {
        warn!("No tools were registered");
    }

    if cli.list_tools {
        let payload: Vec<_> = registry
            .definitions()
            .iter()
            .map(registration_payload)
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let server = BridgeServer::new(registry, &config.server);
    let tracker = server.tracker().clone();
    info!(tools = server.tools().len(), "Serving MCP over stdio");

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP session")?;

    tokio::select! {
        quit = service.waiting() => {
            let reason = quit.context("MCP session task failed")?;
            info!(reason = ?reason, "MCP session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            let cancelled = tracker.cancel_all();
            info!(cancelled, "Interrupted, cancelled in-flight runs");
        }
    }

    Ok(())
}
