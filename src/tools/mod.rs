//! MCP tool implementations.
//!
//! - `schema`: list tables, describe table, column names, foreign keys
//! - `rows`: sample rows, keyword search
//! - `execute`: verbatim statement execution
//!
//! Handlers return `DbResult<ToolOutput>`. [`ToolResponse::from_result`] is the
//! single place where an error becomes the `Error: <message>` convention the
//! calling agent inspects. Arguments arrive wrapped in [`ToolArgs`] so that a
//! malformed call reaches that same place instead of failing at the protocol
//! level.

pub mod execute;
pub mod rows;
pub mod schema;

pub use execute::{ExecuteQueryInput, ExecuteToolHandler};
pub use rows::{KeywordSearchInput, RowsToolHandler, SampleRowsInput};
pub use schema::{SchemaToolHandler, TableInput};

use crate::error::{DbError, DbResult};
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::future::Future;
use tracing::warn;

/// Default row bound for sampling and keyword search.
pub const DEFAULT_ROW_LIMIT: i64 = 5;

pub(crate) fn default_limit() -> i64 {
    DEFAULT_ROW_LIMIT
}

/// Tool arguments whose decoding failure is kept as a value.
///
/// Deserializing never fails: the raw arguments are captured first and then
/// decoded into `T`, and any mismatch (missing field, wrong type) is stored.
/// The published input schema is exactly `T`'s.
#[derive(Debug)]
pub struct ToolArgs<T>(Result<T, String>);

impl<T> ToolArgs<T> {
    pub fn into_input(self) -> DbResult<T> {
        self.0
            .map_err(|e| DbError::validation(format!("Invalid arguments: {}", e)))
    }

    /// Run a handler on the decoded input, or report the decoding error.
    pub async fn run<F, Fut>(self, handler: F) -> DbResult<ToolOutput>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = DbResult<ToolOutput>>,
    {
        handler(self.into_input()?).await
    }
}

impl<T> From<T> for ToolArgs<T> {
    fn from(input: T) -> Self {
        Self(Ok(input))
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ToolArgs<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = JsonValue::deserialize(deserializer)?;
        Ok(Self(serde_json::from_value(raw).map_err(|e| e.to_string())))
    }
}

impl<T: JsonSchema> JsonSchema for ToolArgs<T> {
    fn inline_schema() -> bool {
        T::inline_schema()
    }

    fn schema_name() -> Cow<'static, str> {
        T::schema_name()
    }

    fn schema_id() -> Cow<'static, str> {
        T::schema_id()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        T::json_schema(generator)
    }
}

/// Successful result of a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// One name per entry (tables, columns).
    Names(Vec<String>),
    /// Rows as ordered column values.
    Rows(Vec<Vec<JsonValue>>),
    /// Status line for statements without a result set.
    Status(String),
}

impl ToolOutput {
    pub fn empty_rows() -> Self {
        Self::Rows(Vec::new())
    }

    pub fn affected(count: u64) -> Self {
        Self::Status(format!("{} rows affected.", count))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Names(names) => names.len(),
            Self::Rows(rows) => rows.len(),
            Self::Status(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_values(self) -> Vec<JsonValue> {
        match self {
            Self::Names(names) => names.into_iter().map(JsonValue::String).collect(),
            Self::Rows(rows) => rows.into_iter().map(JsonValue::Array).collect(),
            Self::Status(status) => vec![JsonValue::String(status)],
        }
    }
}

/// Structured content returned to the agent for every tool call.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ToolResponse {
    /// Names, rows (each an array of column values), a status line, or a
    /// single string starting with "Error:".
    pub result: Vec<JsonValue>,
}

impl ToolResponse {
    /// Flatten a tool result; failures become `["Error: <message>"]`.
    pub fn from_result(tool: &str, result: DbResult<ToolOutput>) -> Self {
        match result {
            Ok(output) => Self {
                result: output.into_values(),
            },
            Err(e) => {
                warn!(tool, kind = %e.kind(), error = %e, "Tool failed");
                Self {
                    result: vec![JsonValue::String(format!("Error: {}", e))],
                }
            }
        }
    }

    /// Whether this response carries the error convention.
    pub fn is_error(&self) -> bool {
        matches!(self.result.as_slice(), [JsonValue::String(s)] if s.starts_with("Error:"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use serde_json::json;

    #[test]
    fn test_names_flatten_to_strings() {
        let resp = ToolResponse::from_result(
            "t",
            Ok(ToolOutput::Names(vec!["users".into(), "orders".into()])),
        );
        assert_eq!(resp.result, vec![json!("users"), json!("orders")]);
        assert!(!resp.is_error());
    }

    #[test]
    fn test_rows_flatten_to_arrays() {
        let rows = vec![vec![json!(1), json!("Alice")], vec![json!(2), json!(null)]];
        let resp = ToolResponse::from_result("t", Ok(ToolOutput::Rows(rows)));
        assert_eq!(resp.result, vec![json!([1, "Alice"]), json!([2, null])]);
    }

    #[test]
    fn test_affected_status() {
        let resp = ToolResponse::from_result("t", Ok(ToolOutput::affected(3)));
        assert_eq!(resp.result, vec![json!("3 rows affected.")]);
    }

    #[test]
    fn test_error_convention() {
        let resp = ToolResponse::from_result("t", Err(DbError::validation("bad name")));
        assert_eq!(resp.result.len(), 1);
        assert!(resp.is_error());
        assert_eq!(resp.result[0], json!("Error: Invalid input: bad name"));
    }

    #[test]
    fn test_empty_rows_is_not_error() {
        let resp = ToolResponse::from_result("t", Ok(ToolOutput::empty_rows()));
        assert!(resp.result.is_empty());
        assert!(!resp.is_error());
    }

    #[tokio::test]
    async fn test_missing_argument_becomes_error_response() {
        let args: ToolArgs<TableInput> = serde_json::from_value(json!({})).unwrap();
        let result = args
            .run(|_| async { Ok(ToolOutput::empty_rows()) })
            .await;
        let resp = ToolResponse::from_result("t", result);
        assert!(resp.is_error());
        let text = resp.result[0].as_str().unwrap();
        assert!(text.starts_with("Error: Invalid input: Invalid arguments"), "{text}");
        assert!(text.contains("table_name"), "{text}");
    }

    #[test]
    fn test_wrong_argument_type_is_validation_error() {
        let args: ToolArgs<SampleRowsInput> =
            serde_json::from_value(json!({"table_name": "users", "limit": "abc"})).unwrap();
        let err = args.into_input().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(err.to_string().contains("invalid type"), "{err}");
    }

    #[test]
    fn test_well_formed_arguments_decode() {
        let args: ToolArgs<SampleRowsInput> =
            serde_json::from_value(json!({"table_name": "users"})).unwrap();
        let input = args.into_input().unwrap();
        assert_eq!(input.table_name, "users");
        assert_eq!(input.limit, DEFAULT_ROW_LIMIT);
    }

    #[test]
    fn test_args_publish_the_input_schema() {
        let wrapped = serde_json::to_value(schemars::schema_for!(ToolArgs<TableInput>)).unwrap();
        let plain = serde_json::to_value(schemars::schema_for!(TableInput)).unwrap();
        assert_eq!(wrapped, plain);
        assert!(wrapped["required"].as_array().unwrap().contains(&json!("table_name")));
    }

    #[test]
    fn test_response_serializes_under_result_key() {
        let resp = ToolResponse::from_result("t", Ok(ToolOutput::Names(vec!["a".into()])));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"result": ["a"]}));
    }
}
