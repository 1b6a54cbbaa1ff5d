//! mlservice - Entry Point
//!
//! Assembles the route table and serves it over HTTP.

use clap::Parser;
use mlservice_routes::RouteRegistry;
use mlservice_server::config::ServiceConfig;
use mlservice_server::logging::{init_tracing, LogFormat};
use mlservice_server::build_app;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{error, info};

/// Serve trainable models over HTTP.
#[derive(Parser, Debug)]
#[command(name = "mlservice", author, version, about)]
struct Args {
    /// Listener host (overrides `server.address`)
    #[arg(long)]
    host: Option<IpAddr>,

    /// Listener port (overrides `server.address`)
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = ServiceConfig::load(args.config.as_deref())?;
    config.override_address(args.host, args.port);

    let mut registry = RouteRegistry::claim()?;
    let app = build_app(&mut registry, &config)?;

    let listener = tokio::net::TcpListener::bind(config.server.address).await?;
    info!(address = %config.server.address, routes = app.applied.bound, "Listening");
    axum::serve(listener, app.router).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.log_format);

    if let Err(e) = run(args).await {
        error!(error = format!("{e:#}"), "Server error");
        std::process::exit(1);
    }
}
