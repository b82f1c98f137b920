//! Input validation and escaping for the search query.
//!
//! The surname search runs a `LIKE` match, where `%` and `_` are wildcards.
//! User input is escaped with [`LIKE_ESCAPE`] so those characters match
//! literally, and the query must declare the same escape character.

use crate::error::{ValidationError, utilities::RequiredFieldExt};

/// Escape character declared in the search query's `ESCAPE` clause.
pub const LIKE_ESCAPE: char = '\\';

/// Validates a surname search term.
///
/// # Returns
///
/// The term itself, or `ValidationError::MissingField` when it is absent or empty.
///
/// # Examples
///
/// ```rust
/// use medgate_core::validation::validate_surname;
///
/// assert_eq!(validate_surname(Some("Smith")).unwrap(), "Smith");
/// assert!(validate_surname(Some("")).is_err());
/// assert!(validate_surname(None).is_err());
/// ```
pub fn validate_surname(surname: Option<&str>) -> Result<&str, ValidationError> {
    surname.require_field("Surname")
}

/// Escapes `\`, `%` and `_` for a `LIKE` pattern.
///
/// Backslash is escaped first; otherwise the backslashes introduced for `%`
/// and `_` would themselves be doubled.
///
/// # Examples
///
/// ```rust
/// use medgate_core::validation::escape_for_like;
///
/// assert_eq!(escape_for_like("50%_off"), r"50\%\_off");
/// assert_eq!(escape_for_like(r"a\b"), r"a\\b");
/// ```
pub fn escape_for_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Builds the bound value for a "contains" match on `term`.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_for_like(term))
}
