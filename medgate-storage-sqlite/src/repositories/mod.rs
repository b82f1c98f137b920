//! Repository implementations for SQLite storage

pub mod gateway;

pub use gateway::SqliteQueryGateway;

use async_trait::async_trait;
use medgate_core::{Error, error::StorageError, repositories::RepositoryProvider};
use medgate_migration::MigrationManager;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::migrations::{self, SqliteMigrationManager};

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    gateway: Arc<SqliteQueryGateway>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let gateway = Arc::new(SqliteQueryGateway::new(pool.clone()));
        Self { pool, gateway }
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    type Gateway = SqliteQueryGateway;

    fn gateway(&self) -> Arc<Self::Gateway> {
        Arc::clone(&self.gateway)
    }

    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&migrations::all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Health check failed");
                Error::Storage(StorageError::Connection("Store unreachable".to_string()))
            })?;
        Ok(())
    }
}
