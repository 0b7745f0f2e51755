//! Schema discovery tools.
//!
//! `mysql_list_tables`, `mysql_describe_table`, `mysql_get_table_column_names`
//! and `mysql_get_foreign_keys`.

use crate::db::executor::{fetch_names, fetch_raw, fetch_rows};
use crate::db::{Identifier, SessionProvider, statements};
use crate::error::DbResult;
use crate::tools::ToolOutput;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

/// Input for tools that act on a single table.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableInput {
    /// Table name in the connected schema
    pub table_name: String,
}

/// Handler for schema discovery tools.
#[derive(Clone)]
pub struct SchemaToolHandler {
    sessions: SessionProvider,
}

impl SchemaToolHandler {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }

    /// Names of all tables in the connected schema.
    pub async fn list_tables(&self) -> DbResult<ToolOutput> {
        let names = self
            .sessions
            .scoped(|session| Box::pin(fetch_names(session, statements::LIST_TABLES)))
            .await?;

        info!(
            database = %self.sessions.database(),
            table_count = names.len(),
            "Listed tables"
        );
        Ok(ToolOutput::Names(names))
    }

    /// One row per column: Field, Type, Null, Key, Default, Extra.
    pub async fn describe_table(&self, input: TableInput) -> DbResult<ToolOutput> {
        let table = Identifier::parse(&input.table_name)?;
        let sql = statements::describe_table(&table);

        let rows = self
            .sessions
            .scoped(move |session| Box::pin(async move { fetch_raw(session, &sql).await }))
            .await?;

        info!(table = %table, column_count = rows.len(), "Described table");
        Ok(ToolOutput::Rows(rows))
    }

    pub async fn column_names(&self, input: TableInput) -> DbResult<ToolOutput> {
        let table = Identifier::parse(&input.table_name)?;
        let sql = statements::show_columns(&table);

        let names = self
            .sessions
            .scoped(move |session| Box::pin(async move { fetch_names(session, &sql).await }))
            .await?;

        info!(table = %table, column_count = names.len(), "Listed columns");
        Ok(ToolOutput::Names(names))
    }

    /// Declared foreign keys as (column, referenced table, referenced column).
    ///
    /// An unknown table has no catalog entries and yields no rows.
    pub async fn foreign_keys(&self, input: TableInput) -> DbResult<ToolOutput> {
        let table = Identifier::parse(&input.table_name)?;
        let stmt = statements::foreign_keys(&table);

        let rows = self
            .sessions
            .scoped(move |session| Box::pin(async move { fetch_rows(session, &stmt).await }))
            .await?;

        info!(table = %table, key_count = rows.len(), "Listed foreign keys");
        Ok(ToolOutput::Rows(rows))
    }
}
