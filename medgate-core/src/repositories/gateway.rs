//! Repository trait for the credential check and patient search.

use async_trait::async_trait;

use crate::{Error, PatientRecord};

/// The two fixed, parameterized queries the gateway issues.
///
/// Implementations must bind every caller-supplied value as a query
/// parameter. Input is never spliced into query text.
///
/// # Errors
///
/// Store failures surface as [`Error::Storage`] and are not retried. A missing
/// or empty search term surfaces as [`Error::Validation`].
#[async_trait]
pub trait QueryGateway: Send + Sync + 'static {
    /// Check a username/password pair against the `user` table.
    ///
    /// Passwords are compared as stored, in plaintext.
    ///
    /// # Returns
    ///
    /// `true` iff at least one row matches both values exactly.
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool, Error>;

    /// Find patients whose surname contains `surname`.
    ///
    /// `%`, `_` and `\` in the term match literally. Case sensitivity follows
    /// the store's `LIKE` semantics, and row order is unspecified.
    async fn search_by_surname(&self, surname: Option<&str>)
    -> Result<Vec<PatientRecord>, Error>;
}
