//! Repository traits for data access layer
//!
//! Services talk to storage only through these traits. A storage backend
//! implements [`QueryGateway`] and exposes it through [`RepositoryProvider`],
//! which also carries the lifecycle methods.

pub mod gateway;

pub use gateway::QueryGateway;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Error;

/// Provider trait combining gateway access with storage lifecycle.
///
/// # Example
///
/// ```rust,ignore
/// use medgate_core::repositories::RepositoryProvider;
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     type Gateway = MyGateway;
///
///     fn gateway(&self) -> Arc<Self::Gateway> { Arc::clone(&self.gateway) }
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync + 'static {
    /// The gateway implementation type
    type Gateway: QueryGateway;

    /// Get a shared handle to the query gateway
    fn gateway(&self) -> Arc<Self::Gateway>;

    /// Create the `user` and `patient` tables if needed
    async fn migrate(&self) -> Result<(), Error>;

    /// Check that the store is reachable
    async fn health_check(&self) -> Result<(), Error>;
}
