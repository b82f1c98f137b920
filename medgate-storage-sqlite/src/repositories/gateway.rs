//! SQLite implementation of the query gateway.

use async_trait::async_trait;
use medgate_core::{
    Error, PatientRecord,
    error::StorageError,
    repositories::QueryGateway,
    validation::{contains_pattern, validate_surname},
};
use sqlx::SqlitePool;

// Both statements are fixed text; every input travels as a bound parameter.
const AUTH_QUERY: &str = "SELECT 1 FROM user WHERE username = ?1 AND password = ?2 LIMIT 1";

// Columns are cast so stores that keep dates or doctor ids as numbers still
// map onto the all-text record.
const SEARCH_QUERY: &str = r#"
    SELECT
        CAST(surname AS TEXT) AS surname,
        CAST(forename AS TEXT) AS forename,
        COALESCE(CAST(address AS TEXT), '') AS address,
        COALESCE(CAST(dateOfBirth AS TEXT), '') AS date_of_birth,
        COALESCE(CAST(doctorId AS TEXT), '') AS doctor_id,
        COALESCE(CAST(diagnosis AS TEXT), '') AS diagnosis
    FROM patient
    WHERE surname LIKE ?1 ESCAPE '\'
"#;

/// SQLite query gateway.
pub struct SqliteQueryGateway {
    pool: SqlitePool,
}

impl SqliteQueryGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for search results
#[derive(Debug, sqlx::FromRow)]
struct SqlitePatient {
    surname: String,
    forename: String,
    address: String,
    date_of_birth: String,
    doctor_id: String,
    diagnosis: String,
}

impl From<SqlitePatient> for PatientRecord {
    fn from(row: SqlitePatient) -> Self {
        PatientRecord {
            surname: row.surname,
            forename: row.forename,
            address: row.address,
            date_of_birth: row.date_of_birth,
            doctor_id: row.doctor_id,
            diagnosis: row.diagnosis,
        }
    }
}

#[async_trait]
impl QueryGateway for SqliteQueryGateway {
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool, Error> {
        let row: Option<(i64,)> = sqlx::query_as(AUTH_QUERY)
            .bind(username)
            .bind(password)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to check credentials");
                StorageError::Database("Failed to check credentials".to_string())
            })?;

        Ok(row.is_some())
    }

    async fn search_by_surname(
        &self,
        surname: Option<&str>,
    ) -> Result<Vec<PatientRecord>, Error> {
        let surname = validate_surname(surname)?;

        let rows = sqlx::query_as::<_, SqlitePatient>(SEARCH_QUERY)
            .bind(contains_pattern(surname))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to search patients");
                StorageError::Database("Failed to search patients".to_string())
            })?;

        Ok(rows.into_iter().map(PatientRecord::from).collect())
    }
}
