//! Stdio transport for the MCP server.
//!
//! The default mode: JSON-RPC on stdin/stdout, as launched by MCP clients.

use crate::db::SessionProvider;
use crate::error::{DbError, DbResult};
use crate::mcp::NaturalQueryService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

/// Stdio transport implementation.
pub struct StdioTransport {
    sessions: SessionProvider,
}

impl StdioTransport {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = NaturalQueryService::new(self.sessions.clone());
        let running_service = service
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            // tokio::select! cannot interrupt a blocking stdin read
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseSettings;

    #[test]
    fn test_stdio_transport_creation() {
        let transport = StdioTransport::new(SessionProvider::new(&DatabaseSettings::default()));
        assert_eq!(transport.name(), "stdio");
    }
}
