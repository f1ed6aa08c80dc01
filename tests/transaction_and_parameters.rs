//! End-to-end transaction and parameter round-trip behaviour against the mock driver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nvql::config::{ClusterEndpointList, ConnectionPoolConfig, StorageConfig};
use nvql::connection::Connection;
use nvql::driver::mock::MockDriver;
use nvql::result::{RawResultSet, RawRow, RawValue};
use nvql::types::{ConnectionMode, ConnectionStandbyMode, StorageType, TransactionMode};
use nvql::{ParameterValue, StorageServer};

fn server_with_mock() -> (StorageServer<MockDriver>, Arc<MockDriver>) {
    let driver = Arc::new(MockDriver::new(StorageType::Postgres));
    let config = StorageConfig::new(
        "integration",
        StorageType::Postgres,
        TransactionMode::READ_WRITE | TransactionMode::READ_ONLY | TransactionMode::NON_TRANSACTION,
        ConnectionMode::Server,
        ConnectionPoolConfig::builder().min_connections(1).max_connections(1).build(),
        ClusterEndpointList::new(StorageType::Postgres),
    );

    let mut server = StorageServer::new(config, Arc::clone(&driver));
    let counter = Arc::new(AtomicU64::new(1));
    server.set_primary_factory(Box::new(move |name, _config| {
        let key = counter.fetch_add(1, Ordering::SeqCst);
        Ok(Connection::new(name, StorageType::Postgres, ConnectionStandbyMode::Primary, "mock://", key))
    }));
    assert!(server.try_connect());
    (server, driver)
}

#[test]
fn writable_transaction_commits_through_the_mock_driver() {
    let (server, driver) = server_with_mock();
    driver.when(
        "INSERT INTO users (name) VALUES ($1)",
        RawResultSet::from_rows_affected(1),
    );

    let age: i32 = 30;
    let mut tx = server.begin(TransactionMode::READ_WRITE).unwrap();
    let result = tx
        .execute_with_params("INSERT INTO users (name) VALUES ($1)", &[ParameterValue::Int(&age)])
        .unwrap();
    assert_eq!(result.rows_affected(), 1);
    tx.commit().unwrap();
}

#[test]
fn parameters_round_trip_through_a_query_result() {
    let (server, driver) = server_with_mock();
    driver.when(
        "SELECT id, name FROM users WHERE id = $1",
        RawResultSet::from_rows(vec![RawRow::new(
            vec!["id".into(), "name".into()],
            vec![RawValue::Int(42), RawValue::String("grace".into())],
        )]),
    );

    let id: i32 = 42;
    let mut tx = server.begin(TransactionMode::READ_ONLY).unwrap();
    let result = tx
        .execute_with_params("SELECT id, name FROM users WHERE id = $1", &[ParameterValue::Int(&id)])
        .unwrap();

    let row = result.at(0).unwrap();
    assert_eq!(row.get::<i32>(0).unwrap(), 42);
    assert_eq!(row.get_by_name::<String>("name").unwrap(), "grace");
    tx.commit().unwrap();
}

#[test]
fn non_transaction_mode_executes_ad_hoc_without_begin_commit() {
    let (server, driver) = server_with_mock();
    driver.when("VACUUM", RawResultSet::empty());

    let mut tx = server.begin(TransactionMode::NON_TRANSACTION).unwrap();
    tx.execute_non_prepared("VACUUM").unwrap();
    tx.commit().unwrap();

    assert_eq!(driver.execute_log(), vec!["VACUUM".to_string()]);
}

#[test]
fn dropping_a_transaction_without_committing_rolls_back() {
    let (server, _driver) = server_with_mock();

    {
        let mut tx = server.begin(TransactionMode::READ_WRITE).unwrap();
        tx.execute("SELECT 1").unwrap();
        // tx is dropped here without a commit() call.
    }

    // The connection must have been returned to the pool despite the rollback-on-drop path.
    let tx = server.begin(TransactionMode::READ_WRITE).unwrap();
    tx.commit().unwrap();
}
