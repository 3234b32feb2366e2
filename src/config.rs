use serde::{Deserialize, Serialize};

/// URL used when no `DATABASE_URL` is configured.
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection settings for the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    pub url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Loads configuration from the environment.
    ///
    /// Reads `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS` (via `.env` when
    /// present), falling back to an in-memory database when unset.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            tracing::warn!("DATABASE_URL not set, using in-memory database");
            IN_MEMORY_URL.to_string()
        });

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        Self {
            url,
            max_connections,
        }
    }

    /// Configuration for a private in-memory database.
    ///
    /// In-memory databases are pinned to a single connection: every pooled
    /// connection to `sqlite::memory:` would otherwise open a distinct,
    /// empty database.
    pub fn in_memory() -> Self {
        Self {
            url: IN_MEMORY_URL.to_string(),
            max_connections: 1,
        }
    }

    /// Whether this configuration points at an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_config_uses_single_connection() {
        let config = DatabaseConfig::in_memory();
        assert_eq!(config.max_connections, 1);
        assert!(config.is_in_memory());
    }

    #[test]
    fn file_url_is_not_in_memory() {
        let config = DatabaseConfig {
            url: "sqlite://roster.db".to_string(),
            max_connections: 5,
        };
        assert!(!config.is_in_memory());
    }
}
