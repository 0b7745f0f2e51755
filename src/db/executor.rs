//! Statement execution on a single session.
//!
//! Statements without parameters go over MySQL's text protocol, so anything
//! the server accepts interactively (including statements that cannot be
//! prepared, like `CREATE PROCEDURE`) works. Parameterized statements are
//! prepared and bound positionally.

use crate::db::session::Session;
use crate::db::statements::{BindValue, Statement, produces_result_set};
use crate::db::types::{row_values, string_at};
use crate::error::DbResult;
use futures_util::TryStreamExt;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::{Either, Executor, MySql};
use std::time::Instant;
use tracing::debug;

/// Ordered rows, each an ordered list of column values.
pub type Rows = Vec<Vec<JsonValue>>;

fn normalize(rows: &[MySqlRow]) -> DbResult<Rows> {
    rows.iter().map(row_values).collect()
}

/// What a verbatim statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows(Rows),
    Affected(u64),
}

/// Run a parameterless statement over the text protocol.
pub async fn fetch_raw(session: &mut Session, sql: &str) -> DbResult<Rows> {
    let start = Instant::now();
    let rows = session.connection().fetch_all(sql).await?;
    debug!(
        sql = %sql,
        rows = rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Fetched rows"
    );
    normalize(&rows)
}

/// Run a bound statement.
pub async fn fetch_rows(session: &mut Session, stmt: &Statement) -> DbResult<Rows> {
    if stmt.params.is_empty() {
        return fetch_raw(session, &stmt.sql).await;
    }

    let start = Instant::now();
    let mut query = sqlx::query(&stmt.sql);
    for param in &stmt.params {
        query = bind_param(query, param);
    }
    let rows = query.fetch_all(session.connection()).await?;
    debug!(
        sql = %stmt.sql,
        params = stmt.params.len(),
        rows = rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Fetched rows"
    );
    normalize(&rows)
}

/// First column of every row, as text. A row whose value cannot be read
/// fails the whole call rather than disappearing from the list.
pub async fn fetch_names(session: &mut Session, sql: &str) -> DbResult<Vec<String>> {
    let rows = session.connection().fetch_all(sql).await?;
    rows.iter().map(|row| string_at(row, 0)).collect()
}

/// Run caller-supplied SQL exactly as given, then commit.
///
/// Rows from every result set are returned in order. A statement that
/// returns no rows is reported as rows (empty) if it is a result-set
/// statement, otherwise as the summed affected-row count.
pub async fn execute_verbatim(session: &mut Session, sql: &str) -> DbResult<Outcome> {
    let start = Instant::now();
    let mut rows = Vec::new();
    let mut affected = 0u64;
    {
        let mut stream = session.connection().fetch_many(sql);
        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(done) => affected += done.rows_affected(),
                Either::Right(row) => rows.push(row),
            }
        }
    }
    session.connection().execute("COMMIT").await?;

    debug!(
        sql = %sql,
        rows = rows.len(),
        affected,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Executed statement"
    );

    if !rows.is_empty() || produces_result_set(sql) {
        Ok(Outcome::Rows(normalize(&rows)?))
    } else {
        Ok(Outcome::Affected(affected))
    }
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q BindValue,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        BindValue::Int(v) => query.bind(*v),
        BindValue::Text(v) => query.bind(v.as_str()),
    }
}
