//! Notekeep Server Binary
//!
//! Starts the TCP server for Notekeep.

use std::sync::Arc;

use clap::Parser;
use notekeep::network::Server;
use notekeep::{Config, CredentialGate, Directory};
use tracing_subscriber::{fmt, EnvFilter};

/// Notekeep Server
#[derive(Parser, Debug)]
#[command(name = "notekeep-server")]
#[command(about = "Concurrent in-memory notebook store")]
#[command(version)]
struct Args {
    /// Credential file holding the shared admin secret
    #[arg(short, long, default_value = "./notekeep.cred")]
    cred_file: String,

    /// Host to bind on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// First port to try
    #[arg(long, default_value = "29000")]
    port_start: u16,

    /// Last port to try (inclusive)
    #[arg(long, default_value = "29999")]
    port_end: u16,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Store content budget in MB
    #[arg(short = 's', long, default_value = "64")]
    store_mb: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,notekeep=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Notekeep Server v{}", notekeep::VERSION);
    tracing::info!("Credential file: {}", args.cred_file);
    tracing::info!("Bind host: {}", args.host);

    // Build config from args
    let config = Config::builder()
        .cred_file(&args.cred_file)
        .listen_host(&args.host)
        .port_range(args.port_start, args.port_end)
        .max_connections(args.max_connections)
        .max_store_bytes(args.store_mb * 1024 * 1024)
        .build();

    // The secret is loaded once at startup; a missing or empty file is fatal
    let gate = match CredentialGate::load(&config.cred_file) {
        Ok(gate) => Arc::new(gate),
        Err(e) => {
            tracing::error!("Failed to load credentials: {}", e);
            std::process::exit(1);
        }
    };

    let directory = Arc::new(Directory::new(config.max_store_bytes));

    tracing::info!("Directory initialized");

    // Start server
    let server = Server::new(config, directory, gate);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
