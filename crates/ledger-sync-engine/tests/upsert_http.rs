mod common;

use common::{items, mock_config};
use ledger_sync_engine::{BatchUpserter, Record, RecordSink, SyncError};
use serde_json::{json, Value};
use sync_test_harness::MockDownstream;

fn rows(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

fn upserter(mock: &MockDownstream, batch_size: usize) -> BatchUpserter {
    BatchUpserter::new(reqwest::Client::new(), mock.base_url(), "service-key", batch_size)
}

#[tokio::test]
async fn repeated_upsert_keeps_one_row_with_latest_values() {
    let mock = MockDownstream::start().await.unwrap();
    let upserter = upserter(&mock, 500);

    upserter
        .upsert("invoices", &rows(vec![json!({"id": 1, "status": "pending"})]))
        .await
        .unwrap();
    upserter
        .upsert("invoices", &rows(vec![json!({"id": 1, "status": "paid"})]))
        .await
        .unwrap();

    let stored = mock.rows("invoices");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["status"], "paid");
}

#[tokio::test]
async fn thousand_records_make_two_batches() {
    let mock = MockDownstream::start().await.unwrap();

    let written = upserter(&mock, 500)
        .upsert("contacts", &rows(items(1, 1000)))
        .await
        .unwrap();

    assert_eq!(written, 1000);
    let writes = mock.writes_for("contacts");
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|w| w.rows.len() == 500));
    assert_eq!(mock.rows("contacts").len(), 1000);
}

#[tokio::test]
async fn sends_merge_preference_and_service_credential() {
    let mock = MockDownstream::start().await.unwrap();

    upserter(&mock, 500)
        .upsert("bills", &rows(items(1, 1)))
        .await
        .unwrap();

    let write = &mock.writes()[0];
    assert_eq!(write.prefer.as_deref(), Some("resolution=merge-duplicates"));
    assert_eq!(write.apikey.as_deref(), Some("service-key"));
    assert_eq!(write.authorization.as_deref(), Some("Bearer service-key"));
    assert_eq!(write.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn empty_input_issues_no_call() {
    let mock = MockDownstream::start().await.unwrap();
    assert_eq!(upserter(&mock, 500).upsert("quotes", &[]).await.unwrap(), 0);
    assert!(mock.writes().is_empty());
}

#[tokio::test]
async fn failure_names_table_and_status() {
    let mock = MockDownstream::start().await.unwrap();
    mock.fail_table("orders", 503);

    let err = upserter(&mock, 500)
        .upsert("orders", &rows(items(1, 3)))
        .await
        .unwrap_err();

    match err {
        SyncError::Downstream { table, status, body } => {
            assert_eq!(table, "orders");
            assert_eq!(status, 503);
            assert!(body.contains("table unavailable"));
        }
        other => panic!("expected downstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_batch_stops_and_keeps_earlier_batches() {
    let mock = MockDownstream::start().await.unwrap();
    // The second batch repeats an id, which the store refuses.
    let mut values = items(1, 4);
    values.push(json!({ "id": 5 }));
    values.push(json!({ "id": 5 }));
    values.extend(items(100, 2));

    let err = upserter(&mock, 4)
        .upsert("journal_entries", &rows(values))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Downstream { status: 500, .. }));
    assert_eq!(mock.writes_for("journal_entries").len(), 2);
    assert_eq!(mock.rows("journal_entries").len(), 4);
}

#[tokio::test]
async fn from_config_trims_trailing_slash() {
    let mock = MockDownstream::start().await.unwrap();
    let config = mock_config("http://127.0.0.1:9", &format!("{}/", mock.base_url()));
    let ctx = config.sync_context().unwrap();

    BatchUpserter::from_config(&config, &ctx)
        .unwrap()
        .upsert("taxes", &rows(items(1, 2)))
        .await
        .unwrap();

    assert_eq!(mock.rows("taxes").len(), 2);
}
