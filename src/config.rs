//! Configuration handling for the naturalquery server.
//!
//! Settings come from command line flags, falling back to environment
//! variables (optionally loaded from a `.env` file), falling back to defaults.

use clap::{Parser, ValueEnum};
use sqlx::mysql::MySqlConnectOptions;
use std::path::PathBuf;

pub const DEFAULT_DB_HOST: &str = "127.0.0.1";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_PASSWORD: &str = "example_password";
pub const DEFAULT_DB_NAME: &str = "example_schema";

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for networked clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Immutable connection settings for the MySQL server.
///
/// Built once at start-up and shared by every session; never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    password: String,
    pub database: String,
}

impl DatabaseSettings {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Driver options for one session: schema selected, utf8mb4 charset.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .charset("utf8mb4")
    }
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_DB_HOST,
            DEFAULT_DB_PORT,
            DEFAULT_DB_USER,
            DEFAULT_DB_PASSWORD,
            DEFAULT_DB_NAME,
        )
    }
}

/// Configuration for the naturalquery server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "naturalquery",
    about = "MCP server exposing MySQL schema discovery and query tools to natural-language agents",
    version,
    author
)]
pub struct Config {
    /// MySQL server host
    #[arg(long, default_value = DEFAULT_DB_HOST, env = "DB_HOST")]
    pub db_host: String,

    /// MySQL server port
    #[arg(long, default_value_t = DEFAULT_DB_PORT, env = "DB_PORT")]
    pub db_port: u16,

    /// MySQL user
    #[arg(long, default_value = DEFAULT_DB_USER, env = "DB_USER")]
    pub db_user: String,

    /// MySQL password
    #[arg(
        long,
        default_value = DEFAULT_DB_PASSWORD,
        env = "DB_PASSWORD",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub db_password: String,

    /// Schema (database) every session is scoped to
    #[arg(long, default_value = DEFAULT_DB_NAME, env = "DB_NAME")]
    pub db_name: String,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "MCP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "MCP_HTTP_PORT")]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Bearer tokens accepted by the HTTP transport.
    /// Can be specified multiple times or as comma-separated values.
    /// When set, every HTTP request must carry one of them.
    #[arg(
        long = "auth-token",
        value_name = "TOKEN",
        env = "MCP_AUTH_TOKENS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub auth_tokens: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable logging output (always on for the http transport)
    #[arg(long, env = "MCP_ENABLE_LOGS")]
    pub enable_logs: bool,

    /// Problem found while loading `.env`, reported once logging is set up
    #[arg(skip)]
    pub env_file_warning: Option<String>,
}

impl Config {
    /// Load `.env` (if present) and parse configuration from the command line.
    pub fn load() -> Self {
        let env_file_warning = env_file_warning(dotenvy::dotenv());
        Self {
            env_file_warning,
            ..Self::parse()
        }
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: DEFAULT_DB_PORT,
            db_user: DEFAULT_DB_USER.to_string(),
            db_password: DEFAULT_DB_PASSWORD.to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            auth_tokens: Vec::new(),
            log_level: "info".to_string(),
            json_logs: false,
            enable_logs: false,
            env_file_warning: None,
        }
    }

    /// The immutable database settings shared by every session.
    pub fn database_settings(&self) -> DatabaseSettings {
        DatabaseSettings::new(
            &self.db_host,
            self.db_port,
            &self.db_user,
            &self.db_password,
            &self.db_name,
        )
    }

    /// Whether a tracing subscriber should be installed.
    ///
    /// Stdio stays quiet unless asked so log lines never interleave with
    /// protocol frames.
    pub fn logging_enabled(&self) -> bool {
        self.enable_logs || self.transport == TransportMode::Http
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Describe a `.env` loading failure worth reporting.
///
/// A missing file is the normal case and is not reported; an unreadable or
/// malformed one is, since its settings were silently not applied.
fn env_file_warning(result: Result<PathBuf, dotenvy::Error>) -> Option<String> {
    match result {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(format!("Failed to load .env file: {}", e)),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.db_host, "127.0.0.1");
        assert_eq!(config.db_port, 3306);
        assert_eq!(config.db_user, "root");
        assert_eq!(config.db_name, DEFAULT_DB_NAME);
        assert!(!config.logging_enabled());
    }

    #[test]
    fn test_parse_from_args() {
        let config = Config::parse_from([
            "naturalquery",
            "--db-host",
            "db.internal",
            "--db-port",
            "3307",
            "--db-user",
            "reader",
            "--db-password",
            "s3cret",
            "--db-name",
            "shop",
            "--transport",
            "http",
        ]);
        let settings = config.database_settings();
        assert_eq!(settings.host, "db.internal");
        assert_eq!(settings.port, 3307);
        assert_eq!(settings.user, "reader");
        assert_eq!(settings.password(), "s3cret");
        assert_eq!(settings.database, "shop");
        assert_eq!(config.transport, TransportMode::Http);
        assert!(config.logging_enabled());
    }

    #[test]
    fn test_auth_tokens_comma_separated() {
        let config = Config::parse_from(["naturalquery", "--auth-token", "a,b"]);
        assert_eq!(config.auth_tokens, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_debug_hides_password() {
        let settings = DatabaseSettings::new("h", 3306, "u", "hunter2", "db");
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_missing_env_file_is_silent() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no .env");
        assert_eq!(env_file_warning(Err(dotenvy::Error::Io(missing))), None);
        assert_eq!(env_file_warning(Ok(PathBuf::from(".env"))), None);
    }

    #[test]
    fn test_malformed_env_file_is_reported() {
        let err = dotenvy::Error::LineParse("DB_PASSWORD='unterminated".into(), 12);
        let warning = env_file_warning(Err(err)).unwrap();
        assert!(warning.starts_with("Failed to load .env file"), "{warning}");
    }

    #[test]
    fn test_unreadable_env_file_is_reported() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(env_file_warning(Err(dotenvy::Error::Io(denied))).is_some());
    }

    #[test]
    fn test_connect_options_select_schema() {
        let settings = DatabaseSettings::new("h", 3306, "u", "", "sales");
        assert_eq!(settings.connect_options().get_database(), Some("sales"));
        assert_eq!(settings.password(), "");
    }
}
