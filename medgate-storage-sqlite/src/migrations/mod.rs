use async_trait::async_trait;
use chrono::Utc;
use medgate_migration::{Migration, MigrationError, MigrationManager, MigrationRecord};
use sqlx::{Database, Sqlite, SqlitePool};

/// The schema, in the order it must be applied.
pub fn all() -> Vec<Box<dyn Migration<Sqlite>>> {
    vec![Box::new(CreateUserTable), Box::new(CreatePatientTable)]
}

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MigrationManager<Sqlite> for SqliteMigrationManager {
    async fn initialize(&self) -> Result<(), MigrationError> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL
            );"#,
            self.get_migration_table_name()
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        Ok(())
    }

    async fn up(&self, migrations: &[Box<dyn Migration<Sqlite>>]) -> Result<(), MigrationError> {
        let record = format!(
            "INSERT INTO {} (version, name, applied_at) VALUES (?, ?, ?)",
            self.get_migration_table_name()
        );

        for migration in migrations {
            if self.is_applied(migration.version()).await? {
                continue;
            }

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Applying migration"
            );

            let mut tx = self.pool.begin().await?;
            migration
                .up(&mut *tx as &mut <Sqlite as Database>::Connection)
                .await?;
            sqlx::query(&record)
                .bind(migration.version())
                .bind(migration.name())
                .bind(Utc::now().timestamp())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }

        Ok(())
    }

    async fn down(&self, migrations: &[Box<dyn Migration<Sqlite>>]) -> Result<(), MigrationError> {
        let forget = format!(
            "DELETE FROM {} WHERE version = ?",
            self.get_migration_table_name()
        );

        for migration in migrations {
            if !self.is_applied(migration.version()).await? {
                continue;
            }

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Rolling back migration"
            );

            let mut tx = self.pool.begin().await?;
            migration
                .down(&mut *tx as &mut <Sqlite as Database>::Connection)
                .await?;
            sqlx::query(&forget)
                .bind(migration.version())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }

        Ok(())
    }

    async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        let sql = format!(
            "SELECT version, name, applied_at FROM {} ORDER BY version",
            self.get_migration_table_name()
        );
        let records = sqlx::query_as::<_, MigrationRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE version = ?)",
            self.get_migration_table_name()
        );
        let applied: bool = sqlx::query_scalar(&sql)
            .bind(version)
            .fetch_one(&self.pool)
            .await?;

        Ok(applied)
    }
}

/// Login accounts. Passwords are stored and compared in plaintext.
pub struct CreateUserTable;

#[async_trait]
impl Migration<Sqlite> for CreateUserTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateUserTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                password TEXT NOT NULL,
                UNIQUE(username)
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS user")
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Patient records searched by surname.
pub struct CreatePatientTable;

#[async_trait]
impl Migration<Sqlite> for CreatePatientTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreatePatientTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patient (
                id INTEGER PRIMARY KEY,
                surname TEXT NOT NULL,
                forename TEXT NOT NULL,
                address TEXT,
                dateOfBirth TEXT,
                doctorId TEXT,
                diagnosis TEXT
            );"#,
        )
        .execute(&mut *conn)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_patient_surname ON patient(surname)")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS patient")
            .execute(conn)
            .await?;
        Ok(())
    }
}
