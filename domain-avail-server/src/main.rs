//! Domain Avail HTTP Server
//!
//! Loads layered configuration, builds the lookup engine once and serves it
//! over HTTP until interrupted.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_avail_lib::ServiceConfig;
use domain_avail_server::{create_router, AppState};
use std::path::PathBuf;
use std::process;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-avail-server
#[derive(Parser, Debug)]
#[command(name = "domain-avail-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve domain availability checks across RDAP and registrar APIs")]
#[command(
    long_about = "Serve domain availability checks over HTTP.\n\nEach lookup tries the configured providers in order (RDAP, GoDaddy, Name.com), \
respecting per-provider rate limits. Batches of up to 100 domains are checked concurrently."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Configuration file (overrides discovery and DA_CONFIG)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to bind (overrides server.host)
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Print the effective configuration with credentials masked, then exit
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Log which configuration files are loaded
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing();

    if let Err(e) = run(args).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to stderr, `info` unless `RUST_LOG` says otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServiceConfig::load(args.config.as_deref(), args.verbose)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    let state = AppState::from_config(&config)?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        addr = %listener.local_addr()?,
        environment = %config.environment,
        "domain-avail-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
