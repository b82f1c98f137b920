//! # medgate
//!
//! medgate authenticates users against a SQL store, locks a username out
//! after repeated failed logins, and searches patient records by surname.
//!
//! It is the core behind a small web front end: the transport layer hands in
//! the submitted username, password and surname, and gets back plain values
//! ([`LoginOutcome`], [`PatientRecord`]) or a [`MedgateError`] to render.
//!
//! ## Warning
//!
//! Passwords are stored and compared in plaintext. This matches the existing
//! `user` table and is a known weakness; it is not addressed here.
//!
//! ## Example
//!
//! ```rust,no_run
//! use medgate::{LoginOutcome, MedgateBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let medgate = MedgateBuilder::new()
//!         .with_sqlite("sqlite://patients.db")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     match medgate.login("alice", "secret", Some("Smith")).await? {
//!         LoginOutcome::Authenticated(records) => println!("{} matches", records.len()),
//!         LoginOutcome::InvalidCredentials(_) => println!("Invalid credentials"),
//!         LoginOutcome::Locked(_) => println!("{}", medgate::LOCKED_MESSAGE),
//!     }
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use medgate_core::{QueryGateway, RepositoryProvider, services::LoginService};

pub mod builder;
pub mod config;

pub use builder::{MedgateBuilder, MedgateBuilderError, NoStorage, WithStorage};
pub use config::MedgateConfig;

/// Re-export core types from medgate_core
pub use medgate_core::{
    Clock, Credentials, LockoutConfig, LockoutStatus, LockoutTracker, LoginOutcome,
    PatientRecord, SystemClock,
};

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use medgate_storage_sqlite::{SqliteRepositoryProvider, SqliteStorage};

/// Text shown to a user whose account is locked.
pub const LOCKED_MESSAGE: &str = "Account locked. Please try again later.";

/// Text shown for any operational failure.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Errors that can occur when using medgate.
#[derive(Debug, thiserror::Error)]
pub enum MedgateError {
    /// The caller supplied unusable input, such as an empty surname
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Error when interacting with storage
    #[error("Storage error: {0}")]
    StorageError(String),
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MedgateError {
    /// Text that is safe to show an end user.
    ///
    /// Store and configuration failures collapse to a generic message so
    /// nothing about the store leaks out.
    pub fn user_message(&self) -> &str {
        match self {
            MedgateError::InvalidArgument(msg) => msg,
            MedgateError::StorageError(_) | MedgateError::ConfigError(_) => GENERIC_ERROR_MESSAGE,
        }
    }

    /// Whether the caller, rather than the system, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, MedgateError::InvalidArgument(_))
    }
}

impl From<medgate_core::Error> for MedgateError {
    fn from(err: medgate_core::Error) -> Self {
        match err {
            medgate_core::Error::Validation(e) => MedgateError::InvalidArgument(e.to_string()),
            medgate_core::Error::Storage(e) => MedgateError::StorageError(e.to_string()),
        }
    }
}

/// The coordinator that owns the lockout state and the storage handle.
///
/// One instance should serve the whole process: lockout state lives in
/// memory and is not shared between instances.
///
/// # Example
///
/// ```rust,no_run
/// use medgate::{Medgate, SqliteRepositoryProvider};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = sqlx::SqlitePool::connect("sqlite::memory:").await?;
///     let medgate = Medgate::new(Arc::new(SqliteRepositoryProvider::new(pool)));
///     medgate.migrate().await?;
///
///     assert!(!medgate.is_locked("alice"));
///     Ok(())
/// }
/// ```
pub struct Medgate<R: RepositoryProvider> {
    repositories: Arc<R>,
    lockout: Arc<LockoutTracker>,
    login_service: LoginService<R::Gateway>,
}

impl<R: RepositoryProvider> Medgate<R> {
    /// Create a new instance with the default lockout policy
    /// (five attempts, five minutes).
    pub fn new(repositories: Arc<R>) -> Self {
        Self::with_lockout(repositories, LockoutTracker::new(LockoutConfig::default()))
    }

    /// Create a new instance around an existing lockout tracker.
    pub fn with_lockout(repositories: Arc<R>, lockout: LockoutTracker) -> Self {
        let lockout = Arc::new(lockout);
        let login_service = LoginService::new(repositories.gateway(), Arc::clone(&lockout));

        Self {
            repositories,
            lockout,
            login_service,
        }
    }

    /// Create the `user` and `patient` tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), MedgateError> {
        Ok(self.repositories.migrate().await?)
    }

    pub async fn health_check(&self) -> Result<(), MedgateError> {
        Ok(self.repositories.health_check().await?)
    }

    /// Run a full login: lock check, credential check, then search on success.
    ///
    /// # Arguments
    ///
    /// * `username` - As submitted
    /// * `password` - As submitted, compared in plaintext
    /// * `surname` - Search term; `None` when the field was not submitted
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        surname: Option<&str>,
    ) -> Result<LoginOutcome, MedgateError> {
        let credentials = Credentials::new(username, password);
        Ok(self
            .login_service
            .login_and_search(&credentials, surname)
            .await?)
    }

    /// Check credentials without touching lockout state.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool, MedgateError> {
        Ok(self
            .repositories
            .gateway()
            .authenticate(username, password)
            .await?)
    }

    /// Search patients by surname substring.
    pub async fn search_by_surname(
        &self,
        surname: Option<&str>,
    ) -> Result<Vec<PatientRecord>, MedgateError> {
        Ok(self.repositories.gateway().search_by_surname(surname).await?)
    }

    pub fn is_locked(&self, username: &str) -> bool {
        self.lockout.is_locked(username)
    }

    pub fn lockout_status(&self, username: &str) -> LockoutStatus {
        self.lockout.status(username)
    }

    pub fn record_failed_attempt(&self, username: &str) -> LockoutStatus {
        self.lockout.record_failed_attempt(username)
    }

    pub fn reset_attempts(&self, username: &str) {
        self.lockout.reset_attempts(username)
    }

    /// Lift a lock by hand. Returns whether the username was locked.
    pub fn unlock_account(&self, username: &str) -> bool {
        self.lockout.unlock_account(username)
    }

    pub fn lockout(&self) -> &LockoutTracker {
        &self.lockout
    }
}
