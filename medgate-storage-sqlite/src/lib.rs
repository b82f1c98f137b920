//! SQLite storage backend for medgate.
//!
//! [`SqliteStorage`] owns a pool capped at a single connection, so every
//! statement runs on the same logical connection. It creates the schema on
//! demand and hands out a [`SqliteRepositoryProvider`] exposing the query
//! gateway.
//!
//! # Example
//!
//! ```rust,no_run
//! use medgate_core::{QueryGateway, RepositoryProvider};
//! use medgate_storage_sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), medgate_core::Error> {
//! let storage = SqliteStorage::connect("sqlite://patients.db").await?;
//! storage.migrate().await?;
//!
//! let provider = storage.into_repository_provider();
//! let ok = provider.gateway().authenticate("alice", "secret").await?;
//! # Ok(())
//! # }
//! ```
pub mod migrations;
pub mod repositories;

use std::str::FromStr;

use medgate_core::{
    Error, RepositoryProvider, error::StorageError, error::utilities::DatabaseResultExt,
};
use medgate_migration::{MigrationManager, MigrationRecord};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use repositories::{SqliteQueryGateway, SqliteRepositoryProvider};

use crate::migrations::SqliteMigrationManager;

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `url`, creating the file if it does not exist.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| {
                tracing::error!(error = %e, "Invalid SQLite connection string");
                StorageError::Connection("Invalid SQLite connection string".to_string())
            })?
            .create_if_missing(true);

        // One connection, never recycled: in-memory databases live only as
        // long as their connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to SQLite database");
                StorageError::Connection("Failed to connect to database".to_string())
            })?;

        tracing::info!("Connected to the database");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        SqliteRepositoryProvider::new(self.pool.clone())
            .migrate()
            .await
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        SqliteRepositoryProvider::new(self.pool.clone())
            .health_check()
            .await
    }

    /// Migrations recorded as applied, in version order.
    pub async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>, Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager
            .initialize()
            .await
            .map_db_err_with_context("Failed to initialize migrations")?;
        manager
            .get_applied_migrations()
            .await
            .map_db_err_with_context("Failed to list migrations")
    }

    pub fn into_repository_provider(self) -> SqliteRepositoryProvider {
        SqliteRepositoryProvider::new(self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medgate_core::QueryGateway;

    #[tokio::test]
    async fn test_connect_and_migrate() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let storage = SqliteStorage::connect("sqlite::memory:").await.unwrap();
        storage.health_check().await.unwrap();
        storage.migrate().await.unwrap();
        storage.migrate().await.unwrap();

        let applied = storage.applied_migrations().await.unwrap();
        assert_eq!(applied.len(), 2);

        let provider = storage.into_repository_provider();
        assert!(!provider.gateway().authenticate("alice", "secret").await.unwrap());
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let err = SqliteStorage::connect("postgres://localhost/nope")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Storage(StorageError::Connection(_))));
    }

    #[tokio::test]
    async fn test_connect_creates_missing_file() {
        let path = std::env::temp_dir().join(format!(
            "medgate-test-{}-{}.db",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let url = format!("sqlite://{}", path.display());

        let storage = SqliteStorage::connect(&url).await.unwrap();
        storage.migrate().await.unwrap();
        storage.pool().close().await;

        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
