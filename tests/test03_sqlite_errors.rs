use sqlite_driver_adapter::prelude::*;

async fn adapter_with_schema() -> Result<SqliteAdapter, AdapterError> {
    let adapter = AdapterConfig::builder(":memory:").build()?.connect().await?;
    adapter
        .execute_script(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL UNIQUE);
             CREATE TABLE posts (
                 id INTEGER PRIMARY KEY,
                 user_id INTEGER NOT NULL REFERENCES users(id)
             );
             INSERT INTO users (id, email) VALUES (1, 'a@example.com');",
        )
        .await?;
    Ok(adapter)
}

fn driver_error(result: Result<u64, AdapterError>) -> DriverError {
    match result {
        Err(AdapterError::Driver(err)) => err,
        other => panic!("expected a classified driver error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_table_and_column() -> Result<(), AdapterError> {
    let adapter = adapter_with_schema().await?;

    let err = driver_error(
        adapter
            .execute_raw(&Query::new_without_args("SELECT * FROM nope"))
            .await,
    );
    assert_eq!(
        err.kind,
        DriverErrorKind::TableDoesNotExist {
            table: Some("nope".into())
        }
    );
    assert_eq!(err.original_code.as_deref(), Some("SQLITE_ERROR"));
    assert!(
        err.original_message
            .as_deref()
            .is_some_and(|m| m.contains("no such table"))
    );

    let err = driver_error(
        adapter
            .execute_raw(&Query::new_without_args("SELECT missing FROM users"))
            .await,
    );
    assert_eq!(
        err.kind,
        DriverErrorKind::ColumnNotFound {
            column: Some("missing".into())
        }
    );

    let err = adapter
        .query_raw(&Query::new_without_args(
            "SELECT id FROM users WHERE missing = 1",
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err.as_driver_error().map(|e| &e.kind),
        Some(&DriverErrorKind::ColumnNotFound {
            column: Some("missing".into())
        })
    );

    let err = driver_error(
        adapter
            .execute_raw(&Query::new_without_args(
                "INSERT INTO users (id, nickname) VALUES (2, 'x')",
            ))
            .await,
    );
    assert!(matches!(err.kind, DriverErrorKind::ColumnNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn constraint_violations() -> Result<(), AdapterError> {
    let adapter = adapter_with_schema().await?;

    let err = driver_error(
        adapter
            .execute_raw(&Query::new_without_args(
                "INSERT INTO users (id, email) VALUES (2, 'a@example.com')",
            ))
            .await,
    );
    assert_eq!(
        err.kind,
        DriverErrorKind::UniqueConstraintViolation {
            fields: vec!["email".into()]
        }
    );
    assert_eq!(err.original_code.as_deref(), Some("SQLITE_CONSTRAINT_UNIQUE"));

    let err = driver_error(
        adapter
            .execute_raw(&Query::new_without_args(
                "INSERT INTO users (id, email) VALUES (1, 'b@example.com')",
            ))
            .await,
    );
    assert!(matches!(
        err.kind,
        DriverErrorKind::UniqueConstraintViolation { .. }
    ));

    let err = driver_error(
        adapter
            .execute_raw(&Query::new_without_args(
                "INSERT INTO users (id, email) VALUES (3, NULL)",
            ))
            .await,
    );
    assert_eq!(
        err.kind,
        DriverErrorKind::NullConstraintViolation {
            fields: vec!["email".into()]
        }
    );

    let err = driver_error(
        adapter
            .execute_raw(&Query::new_without_args(
                "INSERT INTO posts (id, user_id) VALUES (1, 42)",
            ))
            .await,
    );
    assert!(matches!(
        err.kind,
        DriverErrorKind::ForeignKeyConstraintViolation { .. }
    ));
    assert_eq!(
        err.original_code.as_deref(),
        Some("SQLITE_CONSTRAINT_FOREIGNKEY")
    );
    Ok(())
}

#[tokio::test]
async fn failing_statement_inside_transaction_keeps_it_usable() -> Result<(), AdapterError> {
    let adapter = adapter_with_schema().await?;
    let mut tx = adapter.start_transaction(None).await?;

    let err = tx
        .execute_raw(&Query::new_without_args(
            "INSERT INTO users (id, email) VALUES (5, 'a@example.com')",
        ))
        .await
        .unwrap_err();
    assert!(err.as_driver_error().is_some());
    assert_eq!(tx.state(), TransactionState::Active);

    tx.execute_raw(&Query::new_without_args(
        "INSERT INTO users (id, email) VALUES (5, 'e@example.com')",
    ))
    .await?;
    tx.commit().await?;
    Ok(())
}

#[tokio::test]
async fn parameter_errors_are_not_driver_errors() -> Result<(), AdapterError> {
    let adapter = adapter_with_schema().await?;
    let err = adapter
        .execute_raw(&Query::new(
            "INSERT INTO users (id, email) VALUES (?, 'z@example.com')",
            vec![Value::Text("not-a-number".into())],
            vec![ArgType::scalar(ScalarType::Int)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::ParameterError(_)));
    assert!(err.as_driver_error().is_none());
    Ok(())
}

#[tokio::test]
async fn lock_contention_maps_to_socket_timeout() -> Result<(), AdapterError> {
    let dir = tempfile::tempdir().map_err(|e| AdapterError::ConfigError(e.to_string()))?;
    let url = format!("file:{}", dir.path().join("busy.db").display());
    let wal = WalSetting::from_json(r#"{"enabled": false, "lockTimeoutMs": 0}"#)?;
    let factory = AdapterConfig::builder(url).wal(wal).build()?;

    let holder = factory.connect().await?;
    holder
        .execute_script("CREATE TABLE jobs (id INTEGER PRIMARY KEY, name TEXT);")
        .await?;
    let contender = factory.connect().await?;

    let mut tx = holder.start_transaction(None).await?;
    tx.execute_raw(&Query::new_without_args(
        "INSERT INTO jobs (name) VALUES ('held')",
    ))
    .await?;

    let err = driver_error(
        contender
            .execute_raw(&Query::new_without_args(
                "INSERT INTO jobs (name) VALUES ('blocked')",
            ))
            .await,
    );
    assert_eq!(err.kind, DriverErrorKind::SocketTimeout);
    assert_eq!(err.original_code.as_deref(), Some("SQLITE_BUSY"));

    tx.rollback().await?;
    contender
        .execute_raw(&Query::new_without_args(
            "INSERT INTO jobs (name) VALUES ('after')",
        ))
        .await?;
    Ok(())
}
