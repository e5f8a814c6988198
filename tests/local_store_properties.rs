mod common;

use chrono::{DateTime, Utc};
use common::{all_backings, ids, printer, record, store_records};
use printdesk_offline::application::ports::{LocalStore, StoreOutcome};
use printdesk_offline::domain::entities::{RecordFilter, SyncMetadataUpdate};
use printdesk_offline::domain::value_objects::{ChangeOperation, MirroredTable, SyncStatus};
use serde_json::json;

#[tokio::test]
async fn initialize_twice_keeps_one_ledger_row_per_table() {
    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();

        let ledger = store.get_sync_metadata().await.unwrap().unwrap_or_default();
        let mut tables: Vec<&str> = ledger.iter().map(|m| m.table_name.as_str()).collect();
        tables.sort();
        let mut expected: Vec<&str> = MirroredTable::ALL.iter().map(|t| t.as_str()).collect();
        expected.sort();

        assert_eq!(tables, expected, "backing {name}");
        assert!(ledger
            .iter()
            .all(|m| m.status == SyncStatus::Pending && m.record_count == 0));
        assert!(store.is_ready());
    }
}

#[tokio::test]
async fn pending_changes_come_back_in_insertion_order() {
    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        for id in ["A", "B", "C"] {
            store
                .add_pending_change(
                    MirroredTable::Printers,
                    id,
                    ChangeOperation::Update,
                    json!({"id": id, "is_available": false}),
                )
                .await
                .unwrap();
        }

        let changes = store.get_pending_changes().await.unwrap().unwrap_or_default();
        let order: Vec<&str> = changes.iter().map(|c| c.record_id.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"], "backing {name}");
        assert!(changes.iter().all(|c| !c.synced));
        assert!(changes
            .iter()
            .all(|c| c.id.as_str().starts_with(&format!("printers_{}_", c.record_id))));
    }
}

#[tokio::test]
async fn marking_synced_is_monotonic_and_idempotent() {
    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        let mut ids = Vec::new();
        for id in ["A", "B", "C"] {
            let change_id = store
                .add_pending_change(MirroredTable::Clients, id, ChangeOperation::Insert, json!({"id": id}))
                .await
                .unwrap()
                .ready()
                .unwrap();
            ids.push(change_id);
        }

        let first = store.mark_change_as_synced(&ids[0]).await.unwrap();
        assert_eq!(first, StoreOutcome::Ready(1), "backing {name}");

        let remaining: Vec<String> = store
            .get_pending_changes()
            .await
            .unwrap()
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.record_id)
            .collect();
        assert_eq!(remaining, vec!["B", "C"]);

        let again = store.mark_change_as_synced(&ids[0]).await.unwrap();
        assert_eq!(again, StoreOutcome::Ready(0));
        assert_eq!(
            store.get_pending_changes().await.unwrap().unwrap_or_default().len(),
            2
        );
    }
}

#[tokio::test]
async fn bulk_insert_replaces_table_contents() {
    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        store
            .bulk_insert(
                MirroredTable::Printers,
                vec![
                    printer("p1", "Old one", true),
                    printer("p2", "Old two", false),
                    printer("p3", "Old three", true),
                ],
            )
            .await
            .unwrap();

        let written = store
            .bulk_insert(
                MirroredTable::Printers,
                vec![printer("n1", "New one", true), printer("n2", "New two", true)],
            )
            .await
            .unwrap();

        assert_eq!(written, StoreOutcome::Ready(2), "backing {name}");
        let rows = store_records(store.as_ref(), MirroredTable::Printers).await;
        assert_eq!(ids(&rows), vec!["n1", "n2"], "backing {name}");
    }
}

#[tokio::test]
async fn bulk_insert_with_no_rows_leaves_mirror_untouched() {
    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        store
            .bulk_insert(MirroredTable::Suppliers, vec![record(json!({"id": "s1", "name": "Acme"}))])
            .await
            .unwrap();

        let written = store.bulk_insert(MirroredTable::Suppliers, Vec::new()).await.unwrap();

        assert_eq!(written, StoreOutcome::Ready(0));
        let rows = store_records(store.as_ref(), MirroredTable::Suppliers).await;
        assert_eq!(ids(&rows), vec!["s1"], "backing {name}");
    }
}

#[tokio::test]
async fn clear_table_removes_every_row() {
    for (name, store) in all_backings() {
        assert_eq!(
            store.clear_table(MirroredTable::Suppliers).await.unwrap(),
            StoreOutcome::NotReady
        );
        store.initialize().await.unwrap();
        store
            .bulk_insert(
                MirroredTable::Suppliers,
                vec![
                    record(json!({"id": "s1", "name": "Acme"})),
                    record(json!({"id": "s2", "name": "Globex"})),
                ],
            )
            .await
            .unwrap();

        let removed = store.clear_table(MirroredTable::Suppliers).await.unwrap();

        assert_eq!(removed, StoreOutcome::Ready(2), "backing {name}");
        assert!(store_records(store.as_ref(), MirroredTable::Suppliers).await.is_empty());
    }
}

#[tokio::test]
async fn partial_metadata_update_keeps_other_fields() {
    let synced_at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();

    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        store
            .update_sync_metadata(
                MirroredTable::Printers,
                SyncMetadataUpdate::new()
                    .last_sync(synced_at)
                    .status(SyncStatus::Synced)
                    .record_count(12),
            )
            .await
            .unwrap();

        let touched = store
            .update_sync_metadata(
                MirroredTable::Printers,
                SyncMetadataUpdate::new()
                    .status(SyncStatus::Error)
                    .error_message("x"),
            )
            .await
            .unwrap();
        assert_eq!(touched, StoreOutcome::Ready(1), "backing {name}");

        let ledger = store.get_sync_metadata().await.unwrap().unwrap_or_default();
        let printers = ledger
            .iter()
            .find(|m| m.table_name == MirroredTable::Printers)
            .unwrap();
        assert_eq!(printers.status, SyncStatus::Error, "backing {name}");
        assert_eq!(printers.error_message.as_deref(), Some("x"));
        assert_eq!(printers.last_sync, synced_at);
        assert_eq!(printers.record_count, 12);
    }
}

#[tokio::test]
async fn data_calls_before_initialize_report_not_ready() {
    for (name, store) in all_backings() {
        assert_eq!(
            store.get_records(MirroredTable::Printers, None).await.unwrap(),
            StoreOutcome::NotReady,
            "backing {name}"
        );
        assert_eq!(store.get_sync_metadata().await.unwrap(), StoreOutcome::NotReady);
        assert_eq!(store.get_pending_changes().await.unwrap(), StoreOutcome::NotReady);
        assert_eq!(
            store
                .bulk_insert(MirroredTable::Printers, vec![printer("p1", "x", true)])
                .await
                .unwrap(),
            StoreOutcome::NotReady
        );
        assert_eq!(
            store.execute_query("DELETE FROM printers", &[]).await.unwrap(),
            StoreOutcome::NotReady
        );
        assert!(store
            .get_records(MirroredTable::Printers, None)
            .await
            .unwrap()
            .unwrap_or_default()
            .is_empty());

        // Nothing written before initialize survives it.
        store.initialize().await.unwrap();
        assert!(store_records(store.as_ref(), MirroredTable::Printers).await.is_empty());
    }
}

#[tokio::test]
async fn filtered_reads_match_on_every_condition() {
    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        store
            .bulk_insert(
                MirroredTable::PrinterAssignments,
                vec![
                    record(json!({"id": "a1", "printer_id": "p1", "client_id": "c1", "is_active": 1})),
                    record(json!({"id": "a2", "printer_id": "p2", "client_id": "c1", "is_active": 0})),
                    record(json!({"id": "a3", "printer_id": "p3", "client_id": "c2", "is_active": 1})),
                ],
            )
            .await
            .unwrap();

        let filter = RecordFilter::new().eq("client_id", "c1").eq("is_active", 1);
        let rows = store
            .get_records(MirroredTable::PrinterAssignments, Some(&filter))
            .await
            .unwrap()
            .unwrap_or_default();

        assert_eq!(ids(&rows), vec!["a1"], "backing {name}");
    }
}

#[tokio::test]
async fn filters_answer_the_same_on_every_backing() {
    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        store
            .bulk_insert(
                MirroredTable::Suppliers,
                vec![
                    record(json!({"id": 7, "name": "Acme"})),
                    record(json!({"id": "8", "name": "Globex"})),
                ],
            )
            .await
            .unwrap();

        let by_numeric_id = store
            .get_records(MirroredTable::Suppliers, Some(&RecordFilter::new().eq("id", 7)))
            .await
            .unwrap()
            .unwrap_or_default();
        assert_eq!(ids(&by_numeric_id), vec!["7"], "backing {name}");

        let by_unknown_column = store
            .get_records(
                MirroredTable::Suppliers,
                Some(&RecordFilter::new().eq("bogus", serde_json::Value::Null)),
            )
            .await
            .unwrap()
            .unwrap_or_default();
        assert!(by_unknown_column.is_empty(), "backing {name}");
    }
}

#[tokio::test]
async fn purge_removes_synced_changes_only() {
    for (name, store) in all_backings() {
        store.initialize().await.unwrap();
        let first = store
            .add_pending_change(MirroredTable::Products, "x1", ChangeOperation::Delete, json!(null))
            .await
            .unwrap()
            .ready()
            .unwrap();
        store
            .add_pending_change(MirroredTable::Products, "x2", ChangeOperation::Delete, json!(null))
            .await
            .unwrap();
        store.mark_change_as_synced(&first).await.unwrap();

        assert_eq!(
            store.purge_synced_changes().await.unwrap(),
            StoreOutcome::Ready(1),
            "backing {name}"
        );
        assert_eq!(
            store.purge_synced_changes().await.unwrap(),
            StoreOutcome::Ready(0)
        );
        let remaining = store.get_pending_changes().await.unwrap().unwrap_or_default();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].record_id, "x2");
    }
}
