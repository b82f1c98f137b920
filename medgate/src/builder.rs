//! Builder pattern for constructing Medgate instances
//!
//! The builder tracks at the type level whether storage has been configured,
//! so `build()` is only available once it has.
//!
//! # Example
//!
//! ```rust,no_run
//! use medgate::MedgateBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let medgate = MedgateBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use medgate_core::{Clock, LockoutConfig, LockoutTracker, RepositoryProvider, SystemClock};

use crate::{Medgate, MedgateConfig};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Medgate instance.
#[derive(Debug, thiserror::Error)]
pub enum MedgateBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Medgate`] instances.
pub struct MedgateBuilder<Storage> {
    storage: Storage,
    lockout_config: LockoutConfig,
    clock: Arc<dyn Clock>,
    apply_migrations: bool,
}

impl Default for MedgateBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl MedgateBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Lockout: enabled, 5 attempts, 5 minute lock
    /// - Clock: system clock
    /// - Apply migrations: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            lockout_config: LockoutConfig::default(),
            clock: Arc::new(SystemClock),
            apply_migrations: false,
        }
    }

    /// Use an already constructed repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> MedgateBuilder<WithStorage<R>> {
        MedgateBuilder {
            storage: WithStorage { repositories },
            lockout_config: self.lockout_config,
            clock: self.clock,
            apply_migrations: self.apply_migrations,
        }
    }
}

#[cfg(feature = "sqlite")]
impl MedgateBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://path/to/db.sqlite")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<MedgateBuilder<WithStorage<crate::SqliteRepositoryProvider>>, MedgateBuilderError>
    {
        let storage = crate::SqliteStorage::connect(url)
            .await
            .map_err(|e| MedgateBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(storage.into_repository_provider())))
    }

    /// Configure SQLite storage with an existing connection pool.
    pub fn with_sqlite_pool(
        self,
        pool: sqlx::SqlitePool,
    ) -> MedgateBuilder<WithStorage<crate::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::SqliteRepositoryProvider::new(pool)))
    }

    /// Connect to the database named by `config` and adopt its lockout policy.
    pub async fn from_config(
        config: &MedgateConfig,
    ) -> Result<MedgateBuilder<WithStorage<crate::SqliteRepositoryProvider>>, MedgateBuilderError>
    {
        Self::new()
            .with_lockout(config.lockout.clone())
            .with_sqlite(&config.database_url())
            .await
    }
}

// ============================================================================
// Configuration Methods (available in any state)
// ============================================================================

impl<S> MedgateBuilder<S> {
    /// Configure the lockout policy.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use medgate::{LockoutConfig, MedgateBuilder};
    /// use chrono::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let medgate = MedgateBuilder::new()
    ///     .with_sqlite("sqlite::memory:")
    ///     .await?
    ///     .with_lockout(LockoutConfig {
    ///         max_failed_attempts: 3,
    ///         lockout_period: Duration::minutes(15),
    ///         ..Default::default()
    ///     })
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_lockout(mut self, config: LockoutConfig) -> Self {
        self.lockout_config = config;
        self
    }

    /// Replace the time source used for lock expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set whether to create the schema during `build()`.
    ///
    /// Default: false
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }
}

impl<R: RepositoryProvider> MedgateBuilder<WithStorage<R>> {
    /// Build the Medgate instance, running migrations first if requested.
    pub async fn build(self) -> Result<Medgate<R>, MedgateBuilderError> {
        self.lockout_config
            .validate()
            .map_err(|e| MedgateBuilderError::InvalidConfiguration(e.to_string()))?;

        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| MedgateBuilderError::Migration(e.to_string()))?;
        }

        let lockout = LockoutTracker::with_clock(self.lockout_config, self.clock);
        Ok(Medgate::with_lockout(self.storage.repositories, lockout))
    }
}
