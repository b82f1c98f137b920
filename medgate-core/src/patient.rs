use serde::{Deserialize, Serialize};

/// A patient row returned by a surname search.
///
/// Values are carried exactly as stored; `date_of_birth` and `doctor_id` are
/// kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub surname: String,
    pub forename: String,
    pub address: String,
    pub date_of_birth: String,
    pub doctor_id: String,
    pub diagnosis: String,
}

/// A username/password pair as submitted by a client.
///
/// Credentials are never persisted. `Debug` redacts the password so the pair
/// can be traced safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
