use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use td_controller::{SERVER_NAME, ToolServer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tuning_lab_core::config::{DEFAULT_CONFIG_PATH, LabConfig};
use tuning_lab_core::osc::SimulationControl;

#[derive(Parser, Debug)]
#[command(author, version, about = "MCP tool server controlling the TouchDesigner tuning simulation")]
struct Args {
    /// Path to config TOML
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// OSC receiver host (overrides config)
    #[arg(long)]
    osc_host: Option<String>,

    /// OSC receiver port (overrides config)
    #[arg(long)]
    osc_port: Option<u16>,
}

fn main() -> Result<()> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let mut cfg = LabConfig::load_or_default(&args.config);
    if let Some(host) = args.osc_host {
        cfg.osc.host = host;
    }
    if let Some(port) = args.osc_port {
        cfg.osc.port = port;
    }

    let control = SimulationControl::connect(&cfg.osc.host, cfg.osc.port)
        .with_context(|| format!("failed to open OSC socket to {}:{}", cfg.osc.host, cfg.osc.port))?;
    info!("{SERVER_NAME} sending OSC to {}", control.client().target());
    let server = ToolServer::new(control);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed reading stdin")?;
        if let Some(reply) = server.handle_line(&line) {
            writeln!(stdout, "{reply}").context("failed writing stdout")?;
            stdout.flush().context("failed flushing stdout")?;
        }
    }
    info!("stdin closed, shutting down");
    Ok(())
}
