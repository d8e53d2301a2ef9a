mod common;

use common::{items, mock_config, FakeSink, FakeUpstream};
use ledger_sync_engine::{EntityStatus, Orchestrator, RunScope, RunStatus};
use serde_json::json;
use std::sync::Arc;
use sync_test_harness::{MockDownstream, MockUpstream};

fn orchestrator(upstream: &Arc<FakeUpstream>, sink: &Arc<FakeSink>) -> Orchestrator {
    Orchestrator::new(upstream.clone(), sink.clone())
}

fn daily_upstream() -> FakeUpstream {
    FakeUpstream::default()
        .with("/2.0/kb_invoice", items(1, 3))
        .with("/2.0/kb_offer", items(10, 2))
        .with("/2.0/kb_order", items(20, 4))
        .with("/4.0/purchase/bills", items(30, 1))
}

#[tokio::test]
async fn downstream_failure_is_isolated_to_its_entity() {
    let upstream = Arc::new(daily_upstream());
    let sink = Arc::new(FakeSink::default().failing("quotes"));

    let result = orchestrator(&upstream, &sink)
        .run(&RunScope::mode("daily").unwrap())
        .await;

    let statuses: Vec<_> = result
        .details
        .iter()
        .map(|d| (d.entity.as_str(), d.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("invoices", EntityStatus::Success),
            ("quotes", EntityStatus::Error),
            ("orders", EntityStatus::Success),
            ("bills", EntityStatus::Success),
        ]
    );
    assert!(result.details[1]
        .error
        .as_deref()
        .unwrap()
        .contains("downstream quotes returned 500"));
    assert_eq!(result.status, RunStatus::Partial);
    assert_eq!(result.total_records, 8);
    assert_eq!(result.mode.as_deref(), Some("daily"));
    assert_eq!(sink.rows("orders").len(), 4);
}

#[tokio::test]
async fn audit_rows_for_each_entity_and_the_run() {
    let upstream = Arc::new(daily_upstream().failing("/2.0/kb_order", 401));
    let sink = Arc::new(FakeSink::default());

    orchestrator(&upstream, &sink)
        .run(&RunScope::mode("daily").unwrap())
        .await;

    let audit = sink.audit_rows();
    let entities: Vec<_> = audit.iter().map(|r| r["entity"].clone()).collect();
    assert_eq!(
        entities,
        vec![
            json!("invoices"),
            json!("quotes"),
            json!("orders"),
            json!("bills"),
            json!("sync_daily")
        ]
    );

    let orders = &audit[2];
    assert_eq!(orders["status"], "error");
    assert_eq!(orders["records_upserted"], 0);
    assert!(orders["error_message"]
        .as_str()
        .unwrap()
        .contains("upstream /2.0/kb_order returned 401"));

    let run = &audit[4];
    assert_eq!(run["status"], "partial");
    assert_eq!(run["records_upserted"], 6);
    assert_eq!(run["error_message"], "Failed: orders");
}

#[tokio::test]
async fn audit_failure_does_not_change_outcomes() {
    let upstream = Arc::new(daily_upstream());
    let sink = Arc::new(FakeSink::default().failing("sync_log"));

    let result = orchestrator(&upstream, &sink)
        .run(&RunScope::mode("daily").unwrap())
        .await;

    assert_eq!(result.status, RunStatus::Success);
    assert!(result.details.iter().all(|d| d.is_success()));
    assert_eq!(sink.rows("invoices").len(), 3);
    assert!(sink.calls().iter().any(|(table, _)| table == "sync_log"));
}

#[tokio::test]
async fn audit_failure_keeps_entity_errors() {
    let upstream = Arc::new(daily_upstream().failing("/2.0/kb_offer", 403));
    let sink = Arc::new(FakeSink::default().failing("sync_log"));

    let result = orchestrator(&upstream, &sink)
        .run(&RunScope::mode("daily").unwrap())
        .await;

    let quotes = &result.details[1];
    assert_eq!(quotes.entity, "quotes");
    assert_eq!(quotes.status, EntityStatus::Error);
    assert!(quotes
        .error
        .as_deref()
        .unwrap()
        .contains("upstream /2.0/kb_offer returned 403"));
    assert_eq!(result.status, RunStatus::Partial);
    assert_eq!(result.error.as_deref(), Some("Failed: quotes"));
    assert_eq!(result.total_records, 8);
    assert!(sink.audit_rows().is_empty());
    assert_eq!(
        sink.calls()
            .iter()
            .filter(|(table, _)| table == "sync_log")
            .count(),
        5
    );
}

#[tokio::test]
async fn every_entity_failing_is_an_error_run() {
    let upstream = Arc::new(daily_upstream());
    let sink = Arc::new(
        FakeSink::default()
            .failing("invoices")
            .failing("quotes")
            .failing("orders")
            .failing("bills"),
    );

    let result = orchestrator(&upstream, &sink)
        .run(&RunScope::mode("daily").unwrap())
        .await;

    assert_eq!(result.status, RunStatus::Error);
    assert_eq!(result.total_records, 0);
    assert_eq!(
        result.error.as_deref(),
        Some("Failed: invoices, quotes, orders, bills")
    );
}

#[tokio::test]
async fn single_entity_run_writes_only_its_audit_row() {
    let upstream = Arc::new(FakeUpstream::default().failing("/4.0/purchase/bills", 429));
    let sink = Arc::new(FakeSink::default());

    let result = orchestrator(&upstream, &sink)
        .run(&RunScope::entity("bills").unwrap())
        .await;

    assert_eq!(result.status, RunStatus::Error);
    assert_eq!(result.entity.as_deref(), Some("bills"));
    assert!(result.error.as_deref().unwrap().contains("429"));

    let audit = sink.audit_rows();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0]["entity"], "bills");
}

#[tokio::test]
async fn payments_skip_failing_parent_and_reuse_cached_invoices() {
    let upstream = Arc::new(
        FakeUpstream::default()
            .with("/2.0/kb_invoice", items(1, 3))
            .with("/2.0/kb_invoice/1/payment", vec![json!({"id": 501, "value": "10.00"})])
            .failing("/2.0/kb_invoice/2/payment", 403)
            .with(
                "/2.0/kb_invoice/3/payment",
                vec![json!({"id": 503, "value": "5"}), json!({"id": 504, "value": "7"})],
            ),
    );
    let sink = Arc::new(FakeSink::default());

    let result = orchestrator(&upstream, &sink)
        .run(&RunScope::mode("sales").unwrap())
        .await;

    let payments = result
        .details
        .iter()
        .find(|d| d.entity == "invoice_payments")
        .unwrap();
    assert_eq!(payments.status, EntityStatus::Success);
    assert_eq!(payments.records, 3);

    let rows = sink.rows("invoice_payments");
    assert_eq!(rows[0]["invoice_id"], 1);
    assert_eq!(rows[2]["invoice_id"], 3);
    assert_eq!(upstream.calls_for("/2.0/kb_invoice"), 1);
}

#[tokio::test]
async fn disabled_cache_refetches_parents() {
    let upstream = Arc::new(FakeUpstream::default().with("/2.0/kb_invoice", items(1, 1)));
    let sink = Arc::new(FakeSink::default());

    orchestrator(&upstream, &sink)
        .with_cache_entries(0)
        .run(&RunScope::mode("sales").unwrap())
        .await;

    assert_eq!(upstream.calls_for("/2.0/kb_invoice"), 2);
}

#[tokio::test]
async fn records_share_one_synced_at_per_run() {
    let upstream = Arc::new(daily_upstream());
    let sink = Arc::new(FakeSink::default());

    orchestrator(&upstream, &sink)
        .run(&RunScope::mode("daily").unwrap())
        .await;

    let stamp = sink.rows("invoices")[0]["synced_at"].clone();
    assert!(sink
        .rows("orders")
        .iter()
        .chain(sink.rows("bills").iter())
        .all(|row| row["synced_at"] == stamp));
}

#[tokio::test]
async fn records_without_id_are_not_written() {
    let upstream = Arc::new(FakeUpstream::default().with(
        "/2.0/contact",
        vec![
            json!({"id": 1, "name_1": "A"}),
            json!({"name_1": "ghost"}),
            json!({"id": 1, "name_1": "A2"}),
        ],
    ));
    let sink = Arc::new(FakeSink::default());

    let result = orchestrator(&upstream, &sink)
        .run(&RunScope::entity("contacts").unwrap())
        .await;

    assert_eq!(result.details[0].fetched, 3);
    assert_eq!(result.total_records, 1);
    assert_eq!(sink.rows("contacts")[0]["name_1"], "A2");
}

#[tokio::test]
async fn full_run_over_http_end_to_end() {
    let upstream = MockUpstream::start().await.unwrap();
    let downstream = MockDownstream::start().await.unwrap();
    upstream.set_items(
        "/2.0/contact",
        vec![
            json!({"id": 1, "name_1": "Alpha AG", "contact_group_ids": [1]}),
            json!({"id": 2, "name_1": "Beta GmbH", "contact_group_ids": "2"}),
            json!({"id": 3, "name_1": "Gamma SA"}),
        ],
    );
    upstream.set_items("/2.0/kb_invoice", vec![]);

    let config = mock_config(&upstream.base_url(), &downstream.base_url());
    let result = Orchestrator::from_config(&config)
        .unwrap()
        .run(&RunScope::full())
        .await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.total_records, 3);

    let body = serde_json::to_value(&result).unwrap();
    assert_eq!(body["totalRecords"], 3);
    let details = body["details"].as_array().unwrap();
    let detail = |name: &str| {
        details
            .iter()
            .find(|d| d["entity"] == name)
            .cloned()
            .unwrap()
    };
    assert_eq!(detail("contacts")["status"], "success");
    assert_eq!(detail("contacts")["records"], 3);
    assert_eq!(detail("invoices")["status"], "success");
    assert_eq!(detail("invoices")["records"], 0);

    let contacts = downstream.rows("contacts");
    assert_eq!(contacts.len(), 3);
    assert_eq!(contacts[0]["is_customer"], true);
    assert_eq!(contacts[1]["is_supplier"], true);

    let audit = downstream.rows("sync_log");
    assert_eq!(audit.len(), 14);
    assert_eq!(audit[13]["entity"], "full_sync");
    assert_eq!(audit[13]["status"], "success");
}
