//! MCP service implementation using rmcp.
//!
//! `NaturalQueryService` registers the seven MySQL tools. Every tool answers
//! with structured content `{"result": [...]}`; handler errors are folded
//! into the `Error: <message>` convention so no call fails at the protocol
//! level.

use crate::db::SessionProvider;
use crate::tools::{
    ExecuteQueryInput, ExecuteToolHandler, KeywordSearchInput, RowsToolHandler, SampleRowsInput,
    SchemaToolHandler, TableInput, ToolArgs, ToolResponse,
};
use rmcp::Json;
use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

pub const SERVER_NAME: &str = "naturalquery";

#[derive(Clone)]
pub struct NaturalQueryService {
    schema: SchemaToolHandler,
    rows: RowsToolHandler,
    execute: ExecuteToolHandler,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl NaturalQueryService {
    pub fn new(sessions: SessionProvider) -> Self {
        Self {
            schema: SchemaToolHandler::new(sessions.clone()),
            rows: RowsToolHandler::new(sessions.clone()),
            execute: ExecuteToolHandler::new(sessions),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl NaturalQueryService {
    #[tool(
        name = "mysql_list_tables",
        title = "List MySQL Tables",
        description = "List all tables in the connected MySQL database.\nReturns one table name per entry.",
        annotations(read_only_hint = true)
    )]
    async fn list_tables(&self) -> Json<ToolResponse> {
        let result = self.schema.list_tables().await;
        Json(ToolResponse::from_result("mysql_list_tables", result))
    }

    #[tool(
        name = "mysql_get_table_sample_rows",
        title = "Get Table Sample Rows",
        description = "Get the first `limit` rows of a table (default 5).\nEach row is an array of column values in table column order.",
        annotations(read_only_hint = true)
    )]
    async fn get_table_sample_rows(
        &self,
        Parameters(args): Parameters<ToolArgs<SampleRowsInput>>,
    ) -> Json<ToolResponse> {
        let result = args.run(|input| self.rows.sample_rows(input)).await;
        Json(ToolResponse::from_result("mysql_get_table_sample_rows", result))
    }

    #[tool(
        name = "mysql_get_table_column_names",
        title = "Get Table Column Names",
        description = "List the column names of a table, in declaration order.",
        annotations(read_only_hint = true)
    )]
    async fn get_table_column_names(
        &self,
        Parameters(args): Parameters<ToolArgs<TableInput>>,
    ) -> Json<ToolResponse> {
        let result = args.run(|input| self.schema.column_names(input)).await;
        Json(ToolResponse::from_result("mysql_get_table_column_names", result))
    }

    #[tool(
        name = "mysql_search_table_by_keyword",
        title = "Search Table by Keyword",
        description = "Find rows where any column contains `keyword` as a substring.\nReturns at most `limit` rows (default 5).",
        annotations(read_only_hint = true)
    )]
    async fn search_table_by_keyword(
        &self,
        Parameters(args): Parameters<ToolArgs<KeywordSearchInput>>,
    ) -> Json<ToolResponse> {
        let result = args.run(|input| self.rows.search_by_keyword(input)).await;
        Json(ToolResponse::from_result("mysql_search_table_by_keyword", result))
    }

    #[tool(
        name = "mysql_get_foreign_keys",
        title = "Get Foreign Key Relationships",
        description = "List the foreign keys declared on a table.\nEach entry is [column, referenced table, referenced column].",
        annotations(read_only_hint = true)
    )]
    async fn get_foreign_keys(
        &self,
        Parameters(args): Parameters<ToolArgs<TableInput>>,
    ) -> Json<ToolResponse> {
        let result = args.run(|input| self.schema.foreign_keys(input)).await;
        Json(ToolResponse::from_result("mysql_get_foreign_keys", result))
    }

    #[tool(
        name = "mysql_describe_table",
        title = "Describe Table",
        description = "Describe the structure of a table.\nOne entry per column: [Field, Type, Null, Key, Default, Extra].",
        annotations(read_only_hint = true)
    )]
    async fn describe_table(
        &self,
        Parameters(args): Parameters<ToolArgs<TableInput>>,
    ) -> Json<ToolResponse> {
        let result = args.run(|input| self.schema.describe_table(input)).await;
        Json(ToolResponse::from_result("mysql_describe_table", result))
    }

    #[tool(
        name = "mysql_execute_query",
        title = "Execute MySQL Query",
        description = "Execute any SQL statement verbatim and commit it.\nReturns result rows, or \"<N> rows affected.\" for statements without a result set.\nA CALL whose procedure returns no rows also reports the affected-row count.\nThere is no confirmation step: destructive statements run immediately.",
        annotations(read_only_hint = false, destructive_hint = true)
    )]
    async fn execute_query(
        &self,
        Parameters(args): Parameters<ToolArgs<ExecuteQueryInput>>,
    ) -> Json<ToolResponse> {
        let result = args.run(|input| self.execute.execute_query(input)).await;
        Json(ToolResponse::from_result("mysql_execute_query", result))
    }
}

#[tool_handler]
impl ServerHandler for NaturalQueryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_owned(),
                title: Some("NaturalQuery MySQL Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MySQL tools for answering natural-language questions about one database.\n\
                \n\
                ## Workflow\n\
                1. `mysql_list_tables` to see what exists\n\
                2. `mysql_describe_table` or `mysql_get_table_column_names` to learn a table's shape\n\
                3. `mysql_get_table_sample_rows` or `mysql_search_table_by_keyword` to look at data\n\
                4. `mysql_get_foreign_keys` to find how tables join\n\
                5. `mysql_execute_query` for anything else\n\
                \n\
                ## Results\n\
                Every tool returns `{\"result\": [...]}`. Rows are arrays of column values.\n\
                A failed call returns a single string starting with `Error:`.\n\
                \n\
                ## Table Names\n\
                Pass table names exactly as stored, without backticks or quoting.\n\
                Any name MySQL accepts works, including ones with spaces, `-` or `.`.\n\
                \n\
                ## Writes\n\
                `mysql_execute_query` runs statements exactly as given and commits them."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseSettings;

    fn create_test_service() -> NaturalQueryService {
        let settings = DatabaseSettings::new("127.0.0.1", 1, "root", "pw", "shop");
        NaturalQueryService::new(SessionProvider::new(&settings))
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "naturalquery");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("Error:"));
    }

    #[test]
    fn test_registers_all_tools() {
        let service = create_test_service();
        let mut names: Vec<String> = service
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "mysql_describe_table",
                "mysql_execute_query",
                "mysql_get_foreign_keys",
                "mysql_get_table_column_names",
                "mysql_get_table_sample_rows",
                "mysql_list_tables",
                "mysql_search_table_by_keyword",
            ]
        );
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_result() {
        let service = create_test_service();
        let Json(resp) = service.list_tables().await;
        assert!(resp.is_error());
        assert!(resp.result[0].as_str().unwrap().starts_with("Error: Connection failed"));
    }

    fn args<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Parameters<ToolArgs<T>> {
        Parameters(serde_json::from_value(value).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_table_is_error_result() {
        let service = create_test_service();
        let Json(resp) = service
            .describe_table(Parameters(
                TableInput {
                    table_name: "a\0b".into(),
                }
                .into(),
            ))
            .await;
        assert!(resp.is_error());
        assert!(resp.result[0].as_str().unwrap().contains("Invalid input"));
    }

    #[tokio::test]
    async fn test_missing_arguments_are_error_results() {
        let service = create_test_service();
        let json = serde_json::json!({});

        let Json(resp) = service.describe_table(args(json.clone())).await;
        assert!(resp.is_error());
        let text = resp.result[0].as_str().unwrap();
        assert!(text.contains("Invalid input") && text.contains("missing field"), "{text}");

        let Json(resp) = service.search_table_by_keyword(args(json.clone())).await;
        assert!(resp.is_error());

        let Json(resp) = service.execute_query(args(json)).await;
        assert!(resp.is_error());
    }

    #[tokio::test]
    async fn test_mistyped_limit_is_error_result() {
        let service = create_test_service();
        let Json(resp) = service
            .get_table_sample_rows(args(serde_json::json!({"table_name": "users", "limit": "abc"})))
            .await;
        assert!(resp.is_error());
        let text = resp.result[0].as_str().unwrap();
        assert!(text.contains("Invalid input") && text.contains("invalid type"), "{text}");
    }
}
