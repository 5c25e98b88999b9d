use sqlite_driver_adapter::prelude::*;
use sqlite_driver_adapter::{AdapterOptionsBuilder, ArgType as Arg};

async fn memory_adapter(options: AdapterOptions) -> Result<SqliteAdapter, AdapterError> {
    AdapterConfig::builder(":memory:")
        .options(options)
        .build()?
        .connect()
        .await
}

fn q(sql: &str, args: Vec<Value>, types: Vec<Arg>) -> Query {
    Query::new(sql, args, types)
}

#[tokio::test]
async fn empty_result_keeps_columns_and_types() -> Result<(), AdapterError> {
    let adapter = memory_adapter(AdapterOptions::default()).await?;
    adapter
        .execute_script("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);")
        .await?;

    let rs = adapter
        .query_raw(&Query::new_without_args("SELECT id, name FROM t WHERE 1=0"))
        .await?;
    assert!(rs.is_empty());
    assert_eq!(rs.column_names, vec!["id".to_string(), "name".to_string()]);
    assert_eq!(rs.column_types, vec![ColumnType::Int32, ColumnType::Text]);
    Ok(())
}

#[tokio::test]
async fn duplicate_column_names_keep_both_values() -> Result<(), AdapterError> {
    let adapter = memory_adapter(AdapterOptions::default()).await?;
    adapter
        .execute_script(
            "CREATE TABLE a (id INTEGER PRIMARY KEY, b_id INTEGER);
             CREATE TABLE b (id INTEGER PRIMARY KEY);
             INSERT INTO b (id) VALUES (7);
             INSERT INTO a (id, b_id) VALUES (1, 7);",
        )
        .await?;

    let rs = adapter
        .query_raw(&Query::new_without_args(
            "SELECT a.id, b.id FROM a JOIN b ON a.b_id = b.id",
        ))
        .await?;
    assert_eq!(rs.column_names, vec!["id".to_string(), "id".to_string()]);
    assert_eq!(rs.rows, vec![vec![Value::Int(1), Value::Int(7)]]);
    Ok(())
}

#[tokio::test]
async fn booleans_round_trip_through_boolean_column() -> Result<(), AdapterError> {
    let adapter = memory_adapter(AdapterOptions::default()).await?;
    adapter
        .execute_script("CREATE TABLE flags (id INTEGER PRIMARY KEY, on_off BOOLEAN);")
        .await?;

    let insert = "INSERT INTO flags (on_off) VALUES (?)";
    let bool_arg = vec![Arg::scalar(ScalarType::Boolean)];
    adapter
        .execute_raw(&q(insert, vec![Value::Boolean(true)], bool_arg.clone()))
        .await?;
    adapter
        .execute_raw(&q(insert, vec![Value::Text("false".into())], bool_arg))
        .await?;

    let rs = adapter
        .query_raw(&Query::new_without_args("SELECT on_off FROM flags ORDER BY id"))
        .await?;
    assert_eq!(rs.column_types, vec![ColumnType::Boolean]);
    assert_eq!(
        rs.rows,
        vec![vec![Value::Boolean(true)], vec![Value::Boolean(false)]]
    );
    Ok(())
}

#[tokio::test]
async fn i64_extremes_survive_as_decimal_strings() -> Result<(), AdapterError> {
    let adapter = memory_adapter(AdapterOptions::default()).await?;
    adapter
        .execute_script("CREATE TABLE nums (id INTEGER PRIMARY KEY, v BIGINT);")
        .await?;

    for v in [i64::MIN, i64::MAX, 9_007_199_254_740_993, 42] {
        adapter
            .execute_raw(&q(
                "INSERT INTO nums (v) VALUES (?)",
                vec![Value::Text(v.to_string())],
                vec![Arg::scalar(ScalarType::BigInt)],
            ))
            .await?;
    }

    let rs = adapter
        .query_raw(&Query::new_without_args("SELECT v FROM nums ORDER BY id"))
        .await?;
    assert_eq!(rs.column_types, vec![ColumnType::Int64]);
    let decoded: Vec<String> = rs
        .rows
        .iter()
        .filter_map(|row| row[0].to_decimal_string())
        .collect();
    assert_eq!(
        decoded,
        vec![
            i64::MIN.to_string(),
            i64::MAX.to_string(),
            "9007199254740993".to_string(),
            "42".to_string(),
        ]
    );
    // Only the small value stays a plain number.
    assert_eq!(rs.rows[3][0], Value::Int(42));
    assert_eq!(rs.rows[0][0], Value::Text(i64::MIN.to_string()));
    Ok(())
}

#[tokio::test]
async fn declared_type_beats_runtime_type() -> Result<(), AdapterError> {
    let adapter = memory_adapter(AdapterOptions::default()).await?;
    adapter
        .execute_script(
            "CREATE TABLE events (d DATE, label VARCHAR(255), n INTEGER UNSIGNED, code CHAR(10));
             INSERT INTO events VALUES ('2024-01-02', 'x', 3, 'c');",
        )
        .await?;

    let rs = adapter
        .query_raw(&Query::new_without_args(
            "SELECT d, label, n, code, typeof(d) AS runtime FROM events",
        ))
        .await?;
    assert_eq!(
        rs.column_types,
        vec![
            ColumnType::Date,
            ColumnType::Text,
            ColumnType::Int32,
            ColumnType::Text,
            ColumnType::Text,
        ]
    );
    assert_eq!(rs.get(0, "runtime"), Some(&Value::Text("text".into())));
    assert_eq!(rs.get(0, "d"), Some(&Value::Text("2024-01-02".into())));
    Ok(())
}

#[tokio::test]
async fn datetime_arguments_follow_timestamp_format() -> Result<(), AdapterError> {
    let dt = chrono::DateTime::parse_from_rfc3339("2024-05-06T07:08:09.123Z")
        .map(|d| d.with_timezone(&chrono::Utc))
        .map_err(|e| AdapterError::ParameterError(e.to_string()))?;

    let iso = memory_adapter(AdapterOptions::default()).await?;
    iso.execute_script("CREATE TABLE ts (at DATETIME);").await?;
    iso.execute_raw(&q(
        "INSERT INTO ts (at) VALUES (?)",
        vec![Value::DateTime(dt)],
        vec![Arg::scalar(ScalarType::DateTime)],
    ))
    .await?;
    let rs = iso
        .query_raw(&Query::new_without_args("SELECT at FROM ts"))
        .await?;
    assert_eq!(
        rs.rows[0][0],
        Value::Text("2024-05-06T07:08:09.123+00:00".into())
    );

    let options = AdapterOptionsBuilder::default()
        .timestamp_format(TimestampFormat::EpochMs)
        .build()?;
    let epoch = memory_adapter(options).await?;
    epoch.execute_script("CREATE TABLE ts (at DATETIME);").await?;
    epoch
        .execute_raw(&q(
            "INSERT INTO ts (at) VALUES (?)",
            vec![Value::Text("2024-05-06T07:08:09.123Z".into())],
            vec![Arg::scalar(ScalarType::DateTime)],
        ))
        .await?;
    let rs = epoch
        .query_raw(&Query::new_without_args(
            "SELECT at, typeof(at) AS storage FROM ts",
        ))
        .await?;
    assert_eq!(rs.get(0, "storage"), Some(&Value::Text("integer".into())));
    // Integers in a DATETIME column come back as ISO-8601 text.
    assert_eq!(
        rs.get(0, "at"),
        Some(&Value::Text("2024-05-06T07:08:09.123+00:00".into()))
    );
    Ok(())
}

#[tokio::test]
async fn wide_integer_coercion_keeps_timestamps_numeric() -> Result<(), AdapterError> {
    let options = AdapterOptions::builder()
        .timestamp_format(TimestampFormat::EpochMs)
        .use_wide_integers(true)
        .allow_wide_integer_numeric_coercion(true)
        .build()?;
    let adapter = memory_adapter(options).await?;
    adapter
        .execute_script(
            "CREATE TABLE t (ms INTEGER);
             INSERT INTO t VALUES (1700000000000);
             INSERT INTO t VALUES (9007199254740993);",
        )
        .await?;

    let rs = adapter
        .query_raw(&Query::new_without_args("SELECT ms FROM t ORDER BY ms"))
        .await?;
    assert_eq!(rs.rows[0][0], Value::Int(1_700_000_000_000));
    assert_eq!(rs.rows[1][0], Value::Text("9007199254740993".into()));
    Ok(())
}

#[tokio::test]
async fn aggregate_flag_only_affects_undeclared_columns() -> Result<(), AdapterError> {
    let options = AdapterOptions::builder()
        .timestamp_format(TimestampFormat::EpochMs)
        .use_wide_integers(true)
        .allow_unsafe_aggregate_on_wide_timestamp(true)
        .build()?;
    let adapter = memory_adapter(options).await?;
    adapter
        .execute_script("CREATE TABLE t (ms BIGINT); INSERT INTO t VALUES (1700000000000);")
        .await?;

    let rs = adapter
        .query_raw(&Query::new_without_args("SELECT ms, MAX(ms) AS latest FROM t"))
        .await?;
    assert_eq!(rs.get(0, "ms"), Some(&Value::Text("1700000000000".into())));
    assert_eq!(rs.get(0, "latest"), Some(&Value::Int(1_700_000_000_000)));
    Ok(())
}

#[tokio::test]
async fn bytes_arguments_decode_to_byte_values() -> Result<(), AdapterError> {
    let adapter = memory_adapter(AdapterOptions::default()).await?;
    adapter.execute_script("CREATE TABLE bin (data BLOB);").await?;
    let bytes_arg = vec![Arg::scalar(ScalarType::Bytes)];
    adapter
        .execute_raw(&q(
            "INSERT INTO bin VALUES (?)",
            vec![Value::Text("AQID".into())],
            bytes_arg.clone(),
        ))
        .await?;
    adapter
        .execute_raw(&q(
            "INSERT INTO bin VALUES (?)",
            vec![Value::List(vec![Value::Int(255), Value::Int(0)])],
            bytes_arg,
        ))
        .await?;

    let rs = adapter
        .query_raw(&Query::new_without_args("SELECT data FROM bin ORDER BY rowid"))
        .await?;
    assert_eq!(rs.column_types, vec![ColumnType::Bytes]);
    assert_eq!(rs.rows[0][0].as_bytes(), Some(&[1u8, 2, 3][..]));
    assert_eq!(rs.rows[1][0].as_bytes(), Some(&[255u8, 0][..]));
    Ok(())
}

#[tokio::test]
async fn statements_without_columns_report_last_insert_id() -> Result<(), AdapterError> {
    let adapter = memory_adapter(AdapterOptions::default()).await?;
    adapter
        .execute_script("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);")
        .await?;

    let rs = adapter
        .query_raw(&q(
            "INSERT INTO t (name) VALUES (?)",
            vec![Value::from("a")],
            vec![Arg::scalar(ScalarType::String)],
        ))
        .await?;
    assert!(rs.column_names.is_empty());
    assert_eq!(rs.last_insert_id.as_deref(), Some("1"));

    let rs = adapter
        .query_raw(&Query::new_without_args(
            "INSERT INTO t (name) VALUES ('r') RETURNING id, name",
        ))
        .await?;
    assert_eq!(rs.rows, vec![vec![Value::Int(2), Value::Text("r".into())]]);
    assert_eq!(rs.last_insert_id.as_deref(), Some("2"));

    let rs = adapter
        .query_raw(&Query::new_without_args("SELECT id FROM t"))
        .await?;
    assert_eq!(rs.last_insert_id, None);

    let affected = adapter
        .execute_raw(&Query::new_without_args(
            "INSERT INTO t (name) VALUES ('b'), ('c')",
        ))
        .await?;
    assert_eq!(affected, 2);

    let affected = adapter
        .execute_raw(&Query::new_without_args(
            "UPDATE t SET name = 'z' WHERE id > 2 RETURNING id",
        ))
        .await?;
    assert_eq!(affected, 2);
    Ok(())
}

#[tokio::test]
async fn reports_provider_and_limits() -> Result<(), AdapterError> {
    let adapter = memory_adapter(AdapterOptions::default()).await?;
    assert_eq!(adapter.provider(), "sqlite");
    assert_eq!(adapter.adapter_name(), "sqlite-driver-adapter");
    let info = adapter.connection_info();
    assert_eq!(info.max_bind_values, 999);
    assert!(!info.supports_relation_joins);
    Ok(())
}
