//! Statement text for the fixed tools.
//!
//! Table names only ever reach statement text through [`Identifier::quoted`],
//! and column names read back from the engine through [`quote_identifier`].
//! Everything else (keywords, limits, the foreign-key table filter) is bound
//! as a parameter.

use super::identifier::{Identifier, quote_identifier};

/// Escape character used in every `LIKE` predicate built here.
pub const LIKE_ESCAPE: char = '!';

pub const LIST_TABLES: &str = "SHOW TABLES";

/// Foreign keys declared by one table of the connected schema.
///
/// `CONVERT(... USING utf8mb4)` keeps the catalog columns text-typed on
/// servers that report them as VARBINARY.
pub const FOREIGN_KEYS: &str = r#"
    SELECT
        CONVERT(COLUMN_NAME USING utf8mb4) AS column_name,
        CONVERT(REFERENCED_TABLE_NAME USING utf8mb4) AS referenced_table,
        CONVERT(REFERENCED_COLUMN_NAME USING utf8mb4) AS referenced_column
    FROM information_schema.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = DATABASE()
      AND TABLE_NAME = ?
      AND REFERENCED_TABLE_NAME IS NOT NULL
    ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
"#;

/// A positional parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

/// Statement text plus its positional parameters, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: BindValue) -> Self {
        self.params.push(value);
        self
    }
}

pub fn describe_table(table: &Identifier) -> String {
    format!("DESCRIBE {}", table.quoted())
}

pub fn show_columns(table: &Identifier) -> String {
    format!("SHOW COLUMNS FROM {}", table.quoted())
}

pub fn foreign_keys(table: &Identifier) -> Statement {
    Statement::new(FOREIGN_KEYS).bind(BindValue::Text(table.as_str().to_string()))
}

/// First `limit` rows of a table in storage order.
///
/// Returns `None` when `limit` is not positive; callers answer with an empty
/// result without contacting the engine.
pub fn sample_rows(table: &Identifier, limit: i64) -> Option<Statement> {
    if limit <= 0 {
        return None;
    }
    Some(Statement::new(format!("SELECT * FROM {} LIMIT ?", table.quoted())).bind(BindValue::Int(limit)))
}

/// Rows where any column contains `keyword` as a literal substring.
///
/// Each column gets one `LIKE ? ESCAPE '!'` predicate and the predicates are
/// OR-ed together. Returns `None` when there are no columns to search or
/// `limit` is not positive.
pub fn build_keyword_search(
    table: &Identifier,
    columns: &[String],
    keyword: &str,
    limit: i64,
) -> Option<Statement> {
    if columns.is_empty() || limit <= 0 {
        return None;
    }

    let pattern = format!("%{}%", escape_like(keyword));
    let predicates: Vec<String> = columns
        .iter()
        .map(|c| format!("{} LIKE ? ESCAPE '{}'", quote_identifier(c), LIKE_ESCAPE))
        .collect();

    let mut stmt = Statement::new(format!(
        "SELECT * FROM {} WHERE {} LIMIT ?",
        table.quoted(),
        predicates.join(" OR ")
    ));
    for _ in columns {
        stmt = stmt.bind(BindValue::Text(pattern.clone()));
    }
    Some(stmt.bind(BindValue::Int(limit)))
}

/// Escape `LIKE` wildcards so the keyword matches literally.
pub fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Leading keywords of statements that answer with a result set.
const RESULT_SET_KEYWORDS: &[&str] = &[
    "SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH", "VALUES", "TABLE", "HELP", "CHECK",
    "ANALYZE", "CHECKSUM", "OPTIMIZE", "REPAIR",
];

/// Whether `sql` is a statement that returns rows even when it matches none.
///
/// Looks at the first keyword only, after skipping whitespace, comments and
/// opening parentheses. `CALL` is not listed: a procedure may or may not
/// select, and the driver does not report column metadata for an empty
/// result set, so a call that yields no rows reports its affected-row count.
pub fn produces_result_set(sql: &str) -> bool {
    match leading_keyword(sql) {
        Some(word) => RESULT_SET_KEYWORDS
            .iter()
            .any(|k| k.eq_ignore_ascii_case(word)),
        None => false,
    }
}

fn leading_keyword(sql: &str) -> Option<&str> {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, tail)| tail)?;
        } else if rest.starts_with("-- ") || rest.starts_with("--\t") || rest.starts_with('#') {
            rest = rest.split_once('\n').map(|(_, tail)| tail)?;
        } else if rest == "--" {
            return None;
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier::parse(name).unwrap()
    }

    #[test]
    fn test_describe_and_show_columns_quote_table() {
        assert_eq!(describe_table(&ident("users")), "DESCRIBE `users`");
        assert_eq!(show_columns(&ident("users")), "SHOW COLUMNS FROM `users`");
    }

    #[test]
    fn test_sample_rows_binds_limit() {
        let stmt = sample_rows(&ident("orders"), 3).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `orders` LIMIT ?");
        assert_eq!(stmt.params, vec![BindValue::Int(3)]);
    }

    #[test]
    fn test_sample_rows_non_positive_limit() {
        assert!(sample_rows(&ident("orders"), 0).is_none());
        assert!(sample_rows(&ident("orders"), -5).is_none());
    }

    #[test]
    fn test_keyword_search_one_predicate_per_column() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let stmt = build_keyword_search(&ident("users"), &columns, "Ali", 5).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM `users` WHERE `id` LIKE ? ESCAPE '!' OR `name` LIKE ? ESCAPE '!' LIMIT ?"
        );
        assert_eq!(
            stmt.params,
            vec![
                BindValue::Text("%Ali%".into()),
                BindValue::Text("%Ali%".into()),
                BindValue::Int(5),
            ]
        );
    }

    #[test]
    fn test_keyword_search_quotes_engine_column_names() {
        let columns = vec!["odd`col".to_string()];
        let stmt = build_keyword_search(&ident("t"), &columns, "x", 1).unwrap();
        assert!(stmt.sql.contains("`odd``col` LIKE ?"));
    }

    #[test]
    fn test_keyword_search_keyword_never_in_text() {
        let columns = vec!["name".to_string()];
        let keyword = "'; DROP TABLE users; --";
        let stmt = build_keyword_search(&ident("users"), &columns, keyword, 5).unwrap();
        assert!(!stmt.sql.contains("DROP"));
    }

    #[test]
    fn test_keyword_search_without_columns() {
        assert!(build_keyword_search(&ident("empty"), &[], "x", 5).is_none());
    }

    #[test]
    fn test_keyword_search_non_positive_limit() {
        let columns = vec!["name".to_string()];
        assert!(build_keyword_search(&ident("users"), &columns, "x", 0).is_none());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50!%");
        assert_eq!(escape_like("a_b"), "a!_b");
        assert_eq!(escape_like("wow!"), "wow!!");
        assert_eq!(escape_like(""), "");
    }

    #[test]
    fn test_foreign_keys_binds_table_name() {
        let stmt = foreign_keys(&ident("orders"));
        assert!(stmt.sql.contains("TABLE_SCHEMA = DATABASE()"));
        assert_eq!(stmt.params, vec![BindValue::Text("orders".into())]);
    }

    #[test]
    fn test_produces_result_set() {
        assert!(produces_result_set("SELECT 1"));
        assert!(produces_result_set("  select * from users where 1=0"));
        assert!(produces_result_set("(SELECT 1) UNION (SELECT 2)"));
        assert!(produces_result_set("/* hint */ SHOW TABLES"));
        assert!(produces_result_set("-- comment\nDESC users"));
        assert!(produces_result_set("# comment\nEXPLAIN SELECT 1"));
        assert!(produces_result_set("WITH t AS (SELECT 1) SELECT * FROM t"));
    }

    #[test]
    fn test_procedure_call_without_rows_reports_status() {
        assert!(!produces_result_set("CALL refresh_totals()"));
        assert!(!produces_result_set("/* nightly */ call p(1)"));
    }

    #[test]
    fn test_statements_without_result_set() {
        assert!(!produces_result_set("INSERT INTO users VALUES (1)"));
        assert!(!produces_result_set("update users set name = 'x'"));
        assert!(!produces_result_set("DELETE FROM users"));
        assert!(!produces_result_set("CREATE TABLE t (id INT)"));
        assert!(!produces_result_set(""));
        assert!(!produces_result_set("/* unterminated"));
        assert!(!produces_result_set("-- only a comment"));
    }
}
