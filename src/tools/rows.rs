//! Row retrieval tools: `mysql_get_table_sample_rows` and
//! `mysql_search_table_by_keyword`.

use crate::db::executor::{fetch_names, fetch_rows};
use crate::db::{Identifier, Rows, SessionProvider, statements};
use crate::error::DbResult;
use crate::tools::{ToolOutput, default_limit};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info};

/// Input for the sample rows tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SampleRowsInput {
    /// Table name in the connected schema
    pub table_name: String,
    /// Maximum number of rows to return. Default: 5. Zero or negative returns no rows.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Input for the keyword search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct KeywordSearchInput {
    /// Table name in the connected schema
    pub table_name: String,
    /// Text to look for in any column (literal substring match)
    pub keyword: String,
    /// Maximum number of rows to return. Default: 5. Zero or negative returns no rows.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Handler for row retrieval tools.
#[derive(Clone)]
pub struct RowsToolHandler {
    sessions: SessionProvider,
}

impl RowsToolHandler {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }

    /// First `limit` rows in the engine's default order.
    pub async fn sample_rows(&self, input: SampleRowsInput) -> DbResult<ToolOutput> {
        let table = Identifier::parse(&input.table_name)?;
        let Some(stmt) = statements::sample_rows(&table, input.limit) else {
            debug!(table = %table, limit = input.limit, "Non-positive limit, skipping fetch");
            return Ok(ToolOutput::empty_rows());
        };

        let rows = self
            .sessions
            .scoped(move |session| Box::pin(async move { fetch_rows(session, &stmt).await }))
            .await?;

        info!(table = %table, row_count = rows.len(), "Sampled rows");
        Ok(ToolOutput::Rows(rows))
    }

    /// Rows where any column contains `keyword`.
    ///
    /// Reads the table's columns first, then matches all of them in one
    /// statement on the same session.
    pub async fn search_by_keyword(&self, input: KeywordSearchInput) -> DbResult<ToolOutput> {
        let table = Identifier::parse(&input.table_name)?;
        if input.limit <= 0 {
            debug!(table = %table, limit = input.limit, "Non-positive limit, skipping search");
            return Ok(ToolOutput::empty_rows());
        }

        let columns_sql = statements::show_columns(&table);
        let search_table = table.clone();
        let keyword = input.keyword;
        let limit = input.limit;

        let rows = self
            .sessions
            .scoped(move |session| {
                Box::pin(async move {
                    let columns = fetch_names(session, &columns_sql).await?;
                    match statements::build_keyword_search(&search_table, &columns, &keyword, limit)
                    {
                        Some(stmt) => fetch_rows(session, &stmt).await,
                        None => Ok(Rows::new()),
                    }
                })
            })
            .await?;

        info!(table = %table, row_count = rows.len(), "Searched table by keyword");
        Ok(ToolOutput::Rows(rows))
    }
}
