//! Error types for the naturalquery server.
//!
//! Every failure inside a tool is one of the variants below. Tools return them
//! as values; the MCP layer turns them into the `Error: <message>` result
//! convention so the calling agent never sees a protocol-level failure.

use thiserror::Error;

/// Coarse classification of a [`DbError`], stable across driver versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Validation,
    Execution,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Validation => write!(f, "validation"),
            Self::Execution => write!(f, "execution"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    /// A session could not be established (network, credentials, unknown schema).
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    /// An argument was rejected before reaching the engine.
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The engine rejected or failed a submitted statement.
    #[error("{}", display_execution(.message, .sql_state.as_deref()))]
    Execution {
        message: String,
        /// e.g. "42S02" for an unknown table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn display_execution(message: &str, sql_state: Option<&str>) -> String {
    match sql_state {
        Some(code) => format!("Database error: {message} (SQLSTATE: {code})"),
        None => format!("Database error: {message}"),
    }
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an execution error with optional SQL state.
    pub fn execution(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Execution { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Re-classify a driver error raised while opening a session.
    ///
    /// Authentication failures and unknown schemas arrive from the server as
    /// ordinary database errors, but for the caller they mean "no session".
    pub fn from_connect(err: sqlx::Error) -> Self {
        match DbError::from(err) {
            DbError::Execution { message, .. } | DbError::Internal { message } => {
                DbError::connection(
                    message,
                    "Check DB_HOST, DB_PORT, DB_USER, DB_PASSWORD and DB_NAME",
                )
            }
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection settings and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::execution(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => DbError::execution(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => DbError::execution(
                format!("Column not found: {}", col),
                None,
                "Check the column names of the table",
            ),
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_execution_display_includes_sql_state() {
        let err = DbError::execution(
            "Table 'shop.nope' doesn't exist",
            Some("42S02".to_string()),
            "check table",
        );
        let text = err.to_string();
        assert!(text.contains("doesn't exist"));
        assert!(text.contains("42S02"));
    }

    #[test]
    fn test_execution_display_without_sql_state() {
        let err = DbError::execution("boom", None, "hint");
        assert_eq!(err.to_string(), "Database error: boom");
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::execution(
            "Syntax error",
            Some("42000".to_string()),
            "Check SQL syntax",
        );
        assert_eq!(err.suggestion(), Some("Check SQL syntax"));
        assert_eq!(DbError::validation("bad").suggestion(), None);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(DbError::connection("a", "b").kind(), ErrorKind::Connection);
        assert_eq!(DbError::validation("a").kind(), ErrorKind::Validation);
        assert_eq!(DbError::execution("a", None, "b").kind(), ErrorKind::Execution);
        assert_eq!(DbError::internal("a").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_sqlx_io_error_is_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: DbError = sqlx::Error::Io(io).into();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_from_connect_reclassifies_row_not_found() {
        let err = DbError::from_connect(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn test_from_connect_keeps_connection_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = DbError::from_connect(sqlx::Error::Io(io));
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("timed out"));
    }
}
