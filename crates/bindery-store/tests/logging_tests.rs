// Structured log events emitted by engine and schema operations

mod common;

use bindery_core::core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use bindery_core::logging_facility::init_test_capture;
use bindery_store::{Column, Database, DatabaseConfig, TableDef};
use common::{User, User1};

#[test]
fn test_schema_and_engine_events() {
    let capture = init_test_capture();

    // Given: A database with a default and a named bind
    let db = Database::new();
    db.initialize("sqlite://", [("logged_one", "sqlite://")]).unwrap();
    db.register::<User>().unwrap();

    // When: The schema is created
    db.create_all().unwrap();

    // Then: create_all logs a start and an end with its table count
    capture.assert_event_exists("create_all", EVENT_START);
    let end = capture
        .events_for_op("create_all")
        .into_iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END))
        .expect("create_all end event");
    assert!(end.field("duration_ms").is_some());
    assert!(end.field("table_count").is_some());

    // And: Engine creation is logged per bind
    let engines = capture.events_for_op("create_engine");
    assert!(engines
        .iter()
        .any(|e| e.event.as_deref() == Some(EVENT_END) && e.bind.as_deref() == Some("<default>")));

    // When: A model routes to a bind that is not configured
    db.register::<User1>().unwrap();
    let err = db.create_all().unwrap_err();
    assert_eq!(err.code(), "ERR_UNKNOWN_BIND");

    // Then: The failure is logged with its code and bind
    assert!(capture
        .error_codes_for_op("create_engine")
        .contains(&"ERR_UNKNOWN_BIND".to_string()));
    assert!(capture
        .events_for_bind("one")
        .iter()
        .any(|e| e.event.as_deref() == Some(EVENT_END_ERROR)));
}

#[test]
fn test_echo_logs_statements() {
    let capture = init_test_capture();

    let config = DatabaseConfig::new("sqlite://")
        .with_bind("echoed", "sqlite://")
        .with_echo(true);
    let db = Database::with_config(config).unwrap();
    db.register_table(TableDef::new("echo_probe").bind("echoed").column(Column::integer("id")))
        .unwrap();
    db.create_all().unwrap();

    let statements: Vec<String> = capture
        .events_for_bind("echoed")
        .into_iter()
        .filter_map(|e| e.fields.get("sql").cloned())
        .collect();
    assert!(statements
        .iter()
        .any(|sql| sql.starts_with("CREATE TABLE IF NOT EXISTS \"echo_probe\"")));
}
