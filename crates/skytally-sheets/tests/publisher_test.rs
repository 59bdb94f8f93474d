use chrono::NaiveDate;
use skytally_core::{InventoryError, Marker, Record, ServiceKind, SnapshotKey, Table};
use skytally_sheets::{
    DiffRequest, MemoryBackend, PublishError, Publisher, SheetsBackend, diff_tabs, load_table,
};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, day).unwrap()
}

fn compute(day: u32, ids: &[&str]) -> Table {
    let columns = vec![
        "account_id".to_string(),
        "region".to_string(),
        "instance_id".to_string(),
        "state".to_string(),
    ];
    let records = ids
        .iter()
        .map(|id| {
            Record::new()
                .with("account_id", "111111111111")
                .with("region", "ap-northeast-2")
                .with("instance_id", *id)
                .with("state", "running")
        })
        .collect();
    Table::new(ServiceKind::Compute, date(day), columns, records)
}

fn buckets(day: u32) -> Table {
    Table::new(
        ServiceKind::ObjectStorage,
        date(day),
        vec!["account_id".into(), "region".into(), "bucket_name".into()],
        vec![
            Record::new()
                .with("account_id", "111111111111")
                .with("region", "us-east-1")
                .with("bucket_name", "audit-logs"),
        ],
    )
}

#[tokio::test]
async fn test_publish_creates_dated_tab_with_header() {
    let publisher = Publisher::new(MemoryBackend::new("doc-1"));
    let sheet = publisher.publish(&compute(14, &["i-1", "i-2"])).await.unwrap();

    assert_eq!(sheet.tab.title, "compute-20241114");
    assert_eq!(sheet.rows_written, 2);
    assert!(!sheet.replaced);
    assert!(sheet.url().starts_with("https://docs.google.com/spreadsheets/d/doc-1#gid="));

    let rows = publisher.backend().rows("compute-20241114").await.unwrap();
    assert_eq!(rows[0], vec!["account_id", "region", "instance_id", "state"]);
    assert_eq!(rows[2][2], "i-2");
}

#[tokio::test]
async fn test_republish_fully_replaces_tab() {
    let publisher = Publisher::new(MemoryBackend::new("doc-1"));
    publisher
        .publish(&compute(14, &["i-1", "i-2", "i-3"]))
        .await
        .unwrap();
    let sheet = publisher.publish(&compute(14, &["i-9"])).await.unwrap();

    assert!(sheet.replaced);
    let rows = publisher.backend().rows("compute-20241114").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][2], "i-9");
    assert_eq!(publisher.backend().tab_titles().await.len(), 1);
}

#[tokio::test]
async fn test_publish_failure_leaves_tables_intact() {
    let publisher = Publisher::new(MemoryBackend::new("doc-1"));
    publisher.backend().deny_writes(true).await;

    let tables = [compute(14, &["i-1"]), buckets(14)];
    let report = publisher.publish_all(&tables).await;

    assert!(!report.is_success());
    assert!(report.nothing_published());
    assert_eq!(report.failed.len(), 2);
    assert!(matches!(
        report.failed[0],
        (ServiceKind::Compute, PublishError::PermissionDenied { .. })
    ));

    // The same in-memory tables can be published again once writes succeed.
    publisher.backend().deny_writes(false).await;
    let retry = publisher.publish_all(&tables).await;
    assert!(retry.is_success());
    assert_eq!(
        publisher.backend().tab_titles().await,
        vec!["compute-20241114", "object-storage-20241114"]
    );
}

#[tokio::test]
async fn test_one_denied_tab_does_not_stop_the_others() {
    let publisher = Publisher::new(MemoryBackend::new("doc-1"));
    publisher.backend().deny_tab("compute-20241114").await;

    let report = publisher
        .publish_all(&[compute(14, &["i-1"]), buckets(14)])
        .await;

    assert!(!report.is_success());
    assert!(!report.nothing_published());
    assert_eq!(report.published.len(), 1);
    assert_eq!(report.published[0].tab.title, "object-storage-20241114");
    assert!(matches!(
        report.failed.as_slice(),
        [(ServiceKind::Compute, PublishError::PermissionDenied { .. })]
    ));
}

#[tokio::test]
async fn test_load_table_round_trips_published_rows() {
    let publisher = Publisher::new(MemoryBackend::new("doc-1"));
    let original = compute(14, &["i-1", "i-2"]);
    publisher.publish(&original).await.unwrap();

    let loaded = load_table(publisher.backend(), ServiceKind::Compute, date(14))
        .await
        .unwrap();
    assert_eq!(loaded.columns(), original.columns());
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.records()[1].cell("instance_id"), "i-2");

    let missing = load_table(publisher.backend(), ServiceKind::Compute, date(1)).await;
    assert!(matches!(missing, Err(PublishError::NotFound(_))));
}

/// target タブがその場でハイライトされ、再実行しても結果が変わらないこと
#[tokio::test]
async fn test_diff_highlights_target_tab_idempotently() {
    let publisher = Publisher::new(MemoryBackend::new("doc-1"));
    publisher.publish(&compute(13, &["i-1", "i-2"])).await.unwrap();
    publisher.publish(&compute(14, &["i-1", "i-3", "i-4"])).await.unwrap();
    let backend = publisher.backend();

    let request = DiffRequest::new(ServiceKind::Compute, date(13), date(14));
    let outcome = diff_tabs(backend, &request).await.unwrap();

    let added: Vec<&str> = outcome.result.added.iter().map(String::as_str).collect();
    assert_eq!(
        added,
        vec![
            "111111111111/ap-northeast-2/i-3",
            "111111111111/ap-northeast-2/i-4"
        ]
    );
    assert_eq!(outcome.result.removed.len(), 1);

    let first_rows = backend.rows("compute-20241114").await.unwrap();
    let first_markers = backend.markers("compute-20241114").await;
    // header, 3 target rows, separator, 1 removed row
    assert_eq!(first_rows.len(), 6);
    assert!(first_rows[4].iter().all(String::is_empty));
    assert_eq!(first_rows[5][2], "i-2");
    assert_eq!(
        first_markers.into_iter().collect::<Vec<_>>(),
        vec![(2, Marker::Addition), (3, Marker::Addition), (5, Marker::Removal)]
    );

    diff_tabs(backend, &request).await.unwrap();
    assert_eq!(backend.rows("compute-20241114").await.unwrap(), first_rows);
    assert_eq!(backend.markers("compute-20241114").await.len(), 3);

    // Source tab is never touched.
    assert!(backend.markers("compute-20241113").await.is_empty());
}

#[tokio::test]
async fn test_diff_without_highlight_leaves_tabs_alone() {
    let publisher = Publisher::new(MemoryBackend::new("doc-1"));
    publisher.publish(&compute(13, &["i-1"])).await.unwrap();
    publisher.publish(&compute(14, &["i-2"])).await.unwrap();

    let mut request = DiffRequest::new(ServiceKind::Compute, date(13), date(14));
    request.highlight = false;
    let outcome = diff_tabs(publisher.backend(), &request).await.unwrap();

    assert!(outcome.highlight.is_none());
    assert!(outcome.result.has_changes());
    assert!(publisher.backend().markers("compute-20241114").await.is_empty());
    assert_eq!(
        publisher.backend().rows("compute-20241114").await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_diff_input_errors_surface() {
    let backend = MemoryBackend::new("doc-1");
    let publisher = Publisher::new(backend);
    publisher.publish(&compute(13, &["i-1"])).await.unwrap();
    publisher.publish(&compute(14, &[])).await.unwrap();

    let request = DiffRequest::new(ServiceKind::Compute, date(13), date(14));
    let err = diff_tabs(publisher.backend(), &request).await.unwrap_err();
    assert!(matches!(err, PublishError::Inventory(InventoryError::DiffInput(_))));

    let mut request = DiffRequest::new(ServiceKind::Compute, date(13), date(13));
    request.key = SnapshotKey::single("bucket_name");
    let err = diff_tabs(publisher.backend(), &request).await.unwrap_err();
    assert!(matches!(
        err,
        PublishError::Inventory(InventoryError::DiffInput(msg)) if msg.contains("bucket_name")
    ));
}

#[tokio::test]
async fn test_backend_reports_its_name() {
    let backend = MemoryBackend::new("doc-1");
    assert_eq!(backend.name(), "memory");
    assert_eq!(backend.spreadsheet_id(), "doc-1");
}
