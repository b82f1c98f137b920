//! Login-then-search flow combining the lockout tracker and the query gateway.

use std::sync::Arc;

use crate::{
    Credentials, Error, LockoutStatus, PatientRecord, repositories::QueryGateway,
    services::LockoutTracker,
};

/// Result of a login attempt that did not fail operationally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The username is locked; credentials were not checked.
    Locked(LockoutStatus),
    /// The credentials did not match. Carries the status after counting the failure.
    InvalidCredentials(LockoutStatus),
    /// The credentials matched and the search ran.
    Authenticated(Vec<PatientRecord>),
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated(_))
    }
}

/// Service driving a single login request.
///
/// The order of operations is: lock check, credential check, then either a
/// reset followed by the search or a recorded failure.
pub struct LoginService<G: QueryGateway> {
    gateway: Arc<G>,
    lockout: Arc<LockoutTracker>,
}

impl<G: QueryGateway> LoginService<G> {
    pub fn new(gateway: Arc<G>, lockout: Arc<LockoutTracker>) -> Self {
        Self { gateway, lockout }
    }

    pub fn lockout(&self) -> &LockoutTracker {
        &self.lockout
    }

    /// Authenticate `credentials` and, on success, search by `surname`.
    ///
    /// A successful login clears the username's failure history before the
    /// search runs, so a missing surname after a good login still resets the
    /// lockout state.
    ///
    /// # Errors
    ///
    /// - [`Error::Storage`] if either query fails. No attempt is recorded when
    ///   the credential check itself fails.
    /// - [`Error::Validation`] if authentication succeeds but `surname` is
    ///   missing or empty.
    pub async fn login_and_search(
        &self,
        credentials: &Credentials,
        surname: Option<&str>,
    ) -> Result<LoginOutcome, Error> {
        let username = credentials.username.as_str();

        if self.lockout.is_locked(username) {
            tracing::warn!(username = %username, "Rejected login for locked account");
            return Ok(LoginOutcome::Locked(self.lockout.status(username)));
        }

        let authenticated = self
            .gateway
            .authenticate(username, &credentials.password)
            .await?;

        if !authenticated {
            let status = self.lockout.record_failed_attempt(username);
            tracing::debug!(
                username = %username,
                failed_attempts = status.failed_attempts,
                "Invalid credentials"
            );
            return Ok(LoginOutcome::InvalidCredentials(status));
        }

        self.lockout.reset_attempts(username);
        let records = self.gateway.search_by_surname(surname).await?;
        tracing::debug!(username = %username, results = records.len(), "Patient search complete");

        Ok(LoginOutcome::Authenticated(records))
    }
}
