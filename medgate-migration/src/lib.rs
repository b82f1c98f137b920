//! Schema migration traits shared by medgate storage backends.
//!
//! A backend implements [`MigrationManager`] once and describes each schema
//! change as a [`Migration`]. Applied versions are recorded in a tracking
//! table so `up` can be run on every start.

use async_trait::async_trait;
use sqlx::Database;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[async_trait]
pub trait Migration<DB: Database>: Send + Sync {
    /// Apply the schema change
    async fn up<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Revert the schema change
    async fn down<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Unique version number; migrations apply in ascending order
    fn version(&self) -> i64;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    /// Unix timestamp, seconds
    pub applied_at: i64,
}

#[async_trait]
pub trait MigrationManager<DB: Database>: Send + Sync {
    fn get_migration_table_name(&self) -> &str {
        "_medgate_migrations"
    }

    /// Create the tracking table if needed
    async fn initialize(&self) -> Result<()>;

    /// Apply every migration not yet recorded
    async fn up(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Revert every recorded migration in the given order
    async fn down(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>>;

    async fn is_applied(&self, version: i64) -> Result<bool>;

    /// Versions from `migrations` that have not been applied yet
    async fn pending_versions(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<Vec<i64>> {
        let mut pending = Vec::new();
        for migration in migrations {
            if !self.is_applied(migration.version()).await? {
                pending.push(migration.version());
            }
        }
        Ok(pending)
    }
}
