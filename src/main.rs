//! naturalquery - Main entry point.
//!
//! Loads configuration, verifies the database is reachable, then serves the
//! MySQL tools over the configured MCP transport.

use naturalquery::auth::AuthConfig;
use naturalquery::config::{Config, TransportMode};
use naturalquery::db::SessionProvider;
use naturalquery::transport::{HttpTransport, StdioTransport, Transport};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Output goes to stderr; stdout belongs to the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    if config.logging_enabled() {
        init_tracing(&config);
    }

    if let Some(warning) = &config.env_file_warning {
        if config.logging_enabled() {
            warn!("{}", warning);
        } else {
            // Stdio without logs: stderr is still free of protocol frames
            eprintln!("Warning: {}", warning);
        }
    }

    info!(
        transport = %config.transport,
        "Starting naturalquery v{}",
        env!("CARGO_PKG_VERSION")
    );

    let settings = config.database_settings();
    info!(?settings, "Database settings loaded");
    let sessions = SessionProvider::new(&settings);

    // Fail fast before any tool is registered
    if let Err(e) = sessions.ping().await {
        error!(error = %e, "Database connectivity check failed");
        eprintln!("Error: {}", e);
        if let Some(hint) = e.suggestion() {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
    info!(database = %sessions.database(), "Database connectivity check passed");

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(sessions).run().await
        }
        TransportMode::Http => {
            let auth = AuthConfig::from_tokens(&config.auth_tokens)?;
            info!(
                addr = %config.http_bind_addr(),
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                sessions,
                auth,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
