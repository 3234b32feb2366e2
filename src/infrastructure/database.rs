use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::DatabaseConfig;
use crate::error::DataError;
use crate::infrastructure::session::{Session, SharedSession};

const CREATE_TEAMS: &str = "\
CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)";

const CREATE_MEMBERS: &str = "\
CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    age INTEGER NOT NULL,
    team_id INTEGER REFERENCES teams (id)
)";

const CREATE_MEMBERS_TEAM_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_members_team ON members (team_id)";

/// Handle to the storage backend: owns the connection pool and opens
/// transaction boundaries.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects according to `config`, with foreign keys enforced on
    /// every connection.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every pooled connection to sqlite::memory: is a distinct
        // database, so in-memory setups are pinned to one connection and
        // that connection is never reaped.
        let max_connections = if config.is_in_memory() && config.max_connections != 1 {
            tracing::warn!(
                requested = config.max_connections,
                "in-memory database limited to a single connection"
            );
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        tracing::debug!(url = %config.url, "database connected");
        Ok(Self { pool })
    }

    /// Connects to a private in-memory database.
    pub async fn in_memory() -> Result<Self, DataError> {
        Self::connect(&DatabaseConfig::in_memory()).await
    }

    /// Creates the schema when it does not exist yet.
    pub async fn migrate(&self) -> Result<(), DataError> {
        for statement in [CREATE_TEAMS, CREATE_MEMBERS, CREATE_MEMBERS_TEAM_INDEX] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("schema migrated");
        Ok(())
    }

    /// Opens a new transaction boundary.
    ///
    /// The session must be finished with `commit` or `rollback`; dropping
    /// it discards its writes.
    pub async fn begin(&self) -> Result<SharedSession, DataError> {
        let tx = self.pool.begin().await?;
        Ok(SharedSession::new(Session::new(tx)))
    }

    /// Runs `work` inside one transaction boundary: commits when it
    /// returns `Ok`, rolls every write back when it returns `Err`.
    pub async fn transaction<T, F, Fut>(&self, work: F) -> Result<T, DataError>
    where
        F: FnOnce(SharedSession) -> Fut,
        Fut: Future<Output = Result<T, DataError>>,
    {
        let session = self.begin().await?;
        match work(session.clone()).await {
            Ok(value) => {
                session.lock().await.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.lock().await.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
