//! Service layer for business logic
//!
//! [`LockoutTracker`] owns the brute force state; [`LoginService`] runs the
//! login-then-search flow on top of a [`QueryGateway`](crate::repositories::QueryGateway).

pub mod lockout;
pub mod login;

pub use lockout::LockoutTracker;
pub use login::{LoginOutcome, LoginService};
