use std::sync::Arc;

use chrono::Duration;
use medgate::{
    LockoutConfig, LoginOutcome, Medgate, MedgateBuilder, MedgateError, SqliteRepositoryProvider,
    SqliteStorage,
};
use medgate_core::ManualClock;

async fn seeded_medgate() -> (Medgate<SqliteRepositoryProvider>, Arc<ManualClock>) {
    let storage = SqliteStorage::connect("sqlite::memory:").await.unwrap();
    storage.migrate().await.unwrap();
    seed(storage.pool()).await;

    let clock = Arc::new(ManualClock::default());
    let medgate = MedgateBuilder::new()
        .with_repositories(Arc::new(storage.into_repository_provider()))
        .with_clock(clock.clone())
        .build()
        .await
        .unwrap();

    (medgate, clock)
}

async fn seed(pool: &sqlx::SqlitePool) {
    sqlx::query("INSERT INTO user (username, password) VALUES ('alice', 'secret')")
        .execute(pool)
        .await
        .unwrap();

    for (surname, forename) in [("Smith", "John"), ("Smithers", "Wayland"), ("Jones", "Mary")] {
        sqlx::query(
            "INSERT INTO patient (surname, forename, address, dateOfBirth, doctorId, diagnosis)
             VALUES (?1, ?2, '1 High St', '1970-01-01', '4', 'Flu')",
        )
        .bind(surname)
        .bind(forename)
        .execute(pool)
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn test_login_returns_matching_patients() {
    let (medgate, _) = seeded_medgate().await;

    let outcome = medgate.login("alice", "secret", Some("Smith")).await.unwrap();
    let LoginOutcome::Authenticated(records) = outcome else {
        panic!("expected authenticated outcome, got {outcome:?}");
    };

    let mut surnames: Vec<_> = records.iter().map(|r| r.surname.as_str()).collect();
    surnames.sort();
    assert_eq!(surnames, vec!["Smith", "Smithers"]);
    assert_eq!(records[0].doctor_id, "4");
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let (medgate, _) = seeded_medgate().await;

    let outcome = medgate.login("alice", "wrong", Some("Smith")).await.unwrap();
    let LoginOutcome::InvalidCredentials(status) = outcome else {
        panic!("expected invalid credentials, got {outcome:?}");
    };
    assert_eq!(status.failed_attempts, 1);
    assert!(!status.is_locked);
}

#[tokio::test]
async fn test_five_failures_lock_even_correct_password() {
    let (medgate, _) = seeded_medgate().await;

    for _ in 0..4 {
        medgate.login("alice", "wrong", Some("Smith")).await.unwrap();
    }
    assert!(!medgate.is_locked("alice"));

    medgate.login("alice", "wrong", Some("Smith")).await.unwrap();
    assert!(medgate.is_locked("alice"));

    let outcome = medgate.login("alice", "secret", Some("Smith")).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Locked(_)));
}

#[tokio::test]
async fn test_lock_expires_after_period() {
    let (medgate, clock) = seeded_medgate().await;

    for _ in 0..5 {
        medgate.login("alice", "wrong", Some("Smith")).await.unwrap();
    }

    clock.advance(Duration::minutes(5));
    assert!(medgate.is_locked("alice"));

    clock.advance(Duration::seconds(1));
    let outcome = medgate.login("alice", "secret", Some("Smith")).await.unwrap();
    assert!(outcome.is_authenticated());
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let (medgate, _) = seeded_medgate().await;

    for _ in 0..4 {
        medgate.login("alice", "wrong", Some("Smith")).await.unwrap();
    }
    assert!(
        medgate
            .login("alice", "secret", Some("Smith"))
            .await
            .unwrap()
            .is_authenticated()
    );
    assert_eq!(medgate.lockout_status("alice").failed_attempts, 0);

    for _ in 0..4 {
        medgate.login("alice", "wrong", Some("Smith")).await.unwrap();
    }
    assert!(!medgate.is_locked("alice"));
}

#[tokio::test]
async fn test_missing_surname_is_invalid_argument() {
    let (medgate, _) = seeded_medgate().await;

    for surname in [None, Some("")] {
        let err = medgate.login("alice", "secret", surname).await.unwrap_err();
        assert!(matches!(err, MedgateError::InvalidArgument(_)));
        assert!(err.user_message().contains("Surname"));
    }
}

#[tokio::test]
async fn test_injection_attempts_are_plain_data() {
    let (medgate, _) = seeded_medgate().await;

    let outcome = medgate
        .login("alice' OR '1'='1", "x' OR '1'='1", Some("Smith"))
        .await
        .unwrap();
    assert!(matches!(outcome, LoginOutcome::InvalidCredentials(_)));

    let records = medgate
        .search_by_surname(Some("' OR '1'='1"))
        .await
        .unwrap();
    assert!(records.is_empty());

    let records = medgate.search_by_surname(Some("%")).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_unlock_account() {
    let (medgate, _) = seeded_medgate().await;

    for _ in 0..5 {
        medgate.record_failed_attempt("alice");
    }
    assert!(medgate.unlock_account("alice"));
    assert!(!medgate.is_locked("alice"));
    assert!(!medgate.unlock_account("alice"));
}

#[tokio::test]
async fn test_builder_runs_migrations() {
    let medgate = MedgateBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .unwrap()
        .with_lockout(LockoutConfig {
            max_failed_attempts: 3,
            ..Default::default()
        })
        .apply_migrations(true)
        .build()
        .await
        .unwrap();

    medgate.health_check().await.unwrap();
    assert!(!medgate.authenticate("alice", "secret").await.unwrap());

    for _ in 0..3 {
        medgate.login("alice", "secret", Some("Smith")).await.unwrap();
    }
    assert!(medgate.is_locked("alice"));
}

#[tokio::test]
async fn test_builder_rejects_zero_threshold() {
    let result = MedgateBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .unwrap()
        .with_lockout(LockoutConfig {
            max_failed_attempts: 0,
            ..Default::default()
        })
        .build()
        .await;

    assert!(matches!(
        result,
        Err(medgate::MedgateBuilderError::InvalidConfiguration(_))
    ));
}

#[tokio::test]
async fn test_search_without_schema_hides_store_error() {
    let medgate = MedgateBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .unwrap()
        .build()
        .await
        .unwrap();

    let err = medgate.search_by_surname(Some("Smith")).await.unwrap_err();
    assert!(matches!(err, MedgateError::StorageError(_)));
    assert_eq!(err.user_message(), medgate::GENERIC_ERROR_MESSAGE);
    assert!(!err.to_string().contains("no such table"));
}

#[tokio::test]
async fn test_builder_rejects_out_of_range_period() {
    for period in [
        Duration::zero(),
        Duration::seconds(-1),
        Duration::days(medgate_core::lockout::MAX_LOCKOUT_DAYS + 1),
    ] {
        let result = MedgateBuilder::new()
            .with_sqlite("sqlite::memory:")
            .await
            .unwrap()
            .with_lockout(LockoutConfig {
                lockout_period: period,
                ..Default::default()
            })
            .build()
            .await;

        assert!(
            matches!(
                result,
                Err(medgate::MedgateBuilderError::InvalidConfiguration(_))
            ),
            "{period:?} should be rejected"
        );
    }
}
