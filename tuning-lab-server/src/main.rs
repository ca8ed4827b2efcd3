use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tuning_lab_core::ModelKind;
use tuning_lab_core::config::{DEFAULT_CONFIG_PATH, LabConfig};
use tuning_lab_server::{AppState, router};

#[derive(Parser, Debug)]
#[command(author, version, about = "Tuning Lab REST API")]
struct Args {
    /// Path to config TOML
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Active model: dummy, physics or ml (overrides config)
    #[arg(long)]
    model: Option<ModelKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = LabConfig::load_or_default(&args.config);
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(kind) = args.model {
        cfg.model.kind = kind;
    }

    let state = AppState::new(cfg.model.kind, cfg.geometry, cfg.physics);
    let app = router(state, &cfg.server.cors_origins);

    let listener = tokio::net::TcpListener::bind((cfg.server.host.as_str(), cfg.server.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cfg.server.host, cfg.server.port))?;
    let addr = listener
        .local_addr()
        .context("bound listener but failed reading local address")?;

    info!("Starting Tuning Lab API server with the {} model", cfg.model.kind);
    info!("tuning-lab-api listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .context("server exited unexpectedly")?;
    Ok(())
}
