//! Core functionality for medgate
//!
//! This crate holds the domain types, the error taxonomy and the two pieces
//! with real invariants:
//!
//! - [`LockoutTracker`](services::LockoutTracker), a per-username state machine
//!   that locks a username after repeated failed logins and lifts the lock
//!   lazily once the lockout period has passed.
//! - [`QueryGateway`](repositories::QueryGateway), the seam for the two fixed,
//!   parameterized queries (credential check and surname search) that storage
//!   backends implement.
//!
//! Storage backends depend on this crate; application code normally goes
//! through the `medgate` facade instead.
pub mod clock;
pub mod error;
pub mod lockout;
pub mod patient;
pub mod repositories;
pub mod services;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use lockout::{LockoutConfig, LockoutStatus, LoginAttemptRecord};
pub use patient::{Credentials, PatientRecord};
pub use repositories::{QueryGateway, RepositoryProvider};
pub use services::{LockoutTracker, LoginOutcome, LoginService};
