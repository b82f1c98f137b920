use crate::{
    Error,
    error::{StorageError, ValidationError},
};

/// Extension trait for Result types to simplify database error mapping
///
/// # Example
///
/// ```rust,ignore
/// use medgate_core::error::utilities::DatabaseResultExt;
///
/// query.fetch_all(&pool).await.map_db_err_with_context("Failed to search patients")?;
/// ```
pub trait DatabaseResultExt<T> {
    /// Convert a database error to a storage error
    fn map_db_err(self) -> Result<T, Error>;

    /// Convert a database error to a storage error with additional context
    fn map_db_err_with_context(self, context: &str) -> Result<T, Error>;
}

impl<T, E: std::fmt::Display> DatabaseResultExt<T> for Result<T, E> {
    fn map_db_err(self) -> Result<T, Error> {
        self.map_err(|e| Error::Storage(StorageError::Database(e.to_string())))
    }

    fn map_db_err_with_context(self, context: &str) -> Result<T, Error> {
        self.map_err(|e| Error::Storage(StorageError::Database(format!("{context}: {e}"))))
    }
}

/// Extension trait for Option types to simplify required field validation
///
/// Absent values and empty strings are both treated as missing, since the
/// transport layer cannot always tell the two apart.
pub trait RequiredFieldExt<'a> {
    /// Convert `None` or `Some("")` to a `ValidationError::MissingField`
    fn require_field(self, field_name: &str) -> Result<&'a str, ValidationError>;
}

impl<'a> RequiredFieldExt<'a> for Option<&'a str> {
    fn require_field(self, field_name: &str) -> Result<&'a str, ValidationError> {
        match self {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ValidationError::MissingField(format!(
                "{field_name} cannot be null or empty"
            ))),
        }
    }
}
