//! Per-invocation database sessions.
//!
//! There is no pool: every tool call opens one MySQL connection, runs its
//! statements on it, and closes it again before returning. [`Session::release`]
//! consumes the session, so it can only ever be released once, and
//! [`SessionProvider::scoped`] guarantees it is released on every exit path.

use crate::config::DatabaseSettings;
use crate::error::{DbError, DbResult};
use futures_util::future::BoxFuture;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens sessions from the static configuration.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    options: Arc<MySqlConnectOptions>,
    database: Arc<str>,
}

impl SessionProvider {
    pub fn new(settings: &DatabaseSettings) -> Self {
        Self::from_options(settings.connect_options())
    }

    /// Use driver options built elsewhere, e.g. parsed from a `mysql://` URL
    /// with `MySqlConnectOptions::from_str`.
    pub fn from_options(options: MySqlConnectOptions) -> Self {
        let database = Arc::from(options.get_database().unwrap_or_default());
        Self {
            options: Arc::new(options),
            database,
        }
    }

    /// Schema every session is scoped to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Open a new session. One attempt, no retry.
    pub async fn acquire(&self) -> DbResult<Session> {
        let conn = self
            .options
            .connect()
            .await
            .map_err(DbError::from_connect)?;
        debug!(database = %self.database, "Session acquired");
        Ok(Session { conn })
    }

    /// Run `op` on a fresh session and release the session afterwards,
    /// whether `op` succeeded or not.
    ///
    /// A failure while closing is logged and does not replace the result of
    /// `op`.
    pub async fn scoped<T, F>(&self, op: F) -> DbResult<T>
    where
        T: Send,
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, DbResult<T>> + Send,
    {
        let mut session = self.acquire().await?;
        let result = op(&mut session).await;
        if let Err(e) = session.release().await {
            warn!(error = %e, "Failed to close session cleanly");
        }
        result
    }

    /// Connectivity check: open a session, run `SELECT 1`, release it.
    pub async fn ping(&self) -> DbResult<()> {
        self.scoped(|session| {
            Box::pin(async move {
                session.conn.ping().await?;
                sqlx::query("SELECT 1").execute(&mut session.conn).await?;
                Ok(())
            })
        })
        .await
    }
}

/// A single live connection owned by one tool invocation.
#[derive(Debug)]
pub struct Session {
    conn: MySqlConnection,
}

impl Session {
    /// Underlying connection, usable as a `sqlx` executor.
    pub fn connection(&mut self) -> &mut MySqlConnection {
        &mut self.conn
    }

    /// Close the connection.
    pub async fn release(self) -> DbResult<()> {
        self.conn.close().await?;
        debug!("Session released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_reports_database() {
        let settings = DatabaseSettings::new("127.0.0.1", 3306, "root", "pw", "shop");
        let provider = SessionProvider::new(&settings);
        assert_eq!(provider.database(), "shop");
    }

    #[test]
    fn test_provider_from_url_options() {
        use std::str::FromStr;
        let options = MySqlConnectOptions::from_str("mysql://app@10.0.0.5:3310/sales").unwrap();
        let provider = SessionProvider::from_options(options);
        assert_eq!(provider.database(), "sales");
    }

    #[tokio::test]
    async fn test_acquire_unreachable_is_connection_error() {
        // Port 1 on loopback is reserved and refuses connections.
        let settings = DatabaseSettings::new("127.0.0.1", 1, "root", "pw", "shop");
        let provider = SessionProvider::new(&settings);
        let err = provider.acquire().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_scoped_does_not_run_op_without_session() {
        let settings = DatabaseSettings::new("127.0.0.1", 1, "root", "pw", "shop");
        let provider = SessionProvider::new(&settings);
        let ran = std::sync::atomic::AtomicBool::new(false);
        let result = provider
            .scoped(|_session| {
                ran.store(true, std::sync::atomic::Ordering::SeqCst);
                Box::pin(async { Ok(()) })
            })
            .await;
        assert!(result.is_err());
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }
}
