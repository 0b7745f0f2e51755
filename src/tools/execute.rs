//! Verbatim statement execution: `mysql_execute_query`.
//!
//! Statement text is run exactly as supplied, with no classification or
//! rewriting. Exposure of this tool is controlled at the transport layer.

use crate::db::executor::execute_verbatim;
use crate::db::{Outcome, SessionProvider};
use crate::error::{DbError, DbResult};
use crate::tools::ToolOutput;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

/// Input for the execute query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// SQL statement to execute as-is. Writes are committed immediately.
    pub query: String,
}

/// Handler for verbatim execution.
#[derive(Clone)]
pub struct ExecuteToolHandler {
    sessions: SessionProvider,
}

impl ExecuteToolHandler {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }

    /// Rows when the statement has a result set, otherwise
    /// `"<N> rows affected."`.
    pub async fn execute_query(&self, input: ExecuteQueryInput) -> DbResult<ToolOutput> {
        if input.query.trim().is_empty() {
            return Err(DbError::validation("Query cannot be empty"));
        }

        let sql = input.query;
        let outcome = self
            .sessions
            .scoped(move |session| Box::pin(async move { execute_verbatim(session, &sql).await }))
            .await?;

        match outcome {
            Outcome::Rows(rows) => {
                info!(row_count = rows.len(), "Executed query");
                Ok(ToolOutput::Rows(rows))
            }
            Outcome::Affected(count) => {
                info!(rows_affected = count, "Executed statement");
                Ok(ToolOutput::affected(count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseSettings;
    use crate::error::ErrorKind;

    fn unreachable_handler() -> ExecuteToolHandler {
        let settings = DatabaseSettings::new("127.0.0.1", 1, "root", "pw", "shop");
        ExecuteToolHandler::new(SessionProvider::new(&settings))
    }

    #[test]
    fn test_execute_input_deserialize() {
        let input: ExecuteQueryInput =
            serde_json::from_str(r#"{"query": "SELECT 1"}"#).unwrap();
        assert_eq!(input.query, "SELECT 1");
    }

    #[tokio::test]
    async fn test_blank_query_is_validation_error() {
        let handler = unreachable_handler();
        for query in ["", "   ", "\n\t"] {
            let err = handler
                .execute_query(ExecuteQueryInput {
                    query: query.into(),
                })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_execute_surfaces_connection_error() {
        let handler = unreachable_handler();
        let err = handler
            .execute_query(ExecuteQueryInput {
                query: "SELECT 1".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
}
