//! Dev Tools Server Entry Point
//!
//! This is the main entry point for the dev tools server. It initializes
//! logging, loads configuration, discovers the tools and starts the HTTP
//! transport.

use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use devtools_server::core::{Config, DevToolsServer, HttpTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    if config.upstream.has_placeholder_token() {
        warn!(
            "Using the placeholder upstream token. \
             Set DEVTOOLS_UPSTREAM_TOKEN for authenticated upstream calls"
        );
    }

    let transport = HttpTransport::new(config.http.clone());

    // Discover tools and register their routes
    let server = DevToolsServer::new(config);

    info!("Server initialized with {} tool(s)", server.tools_count().await);

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
