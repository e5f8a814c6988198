use crate::application::ports::{ConnectivityProbe, LocalStore, RemoteQuery, RemoteTableStore, SortDirection};
use crate::domain::entities::{
    AssignedPrinter, ClientSummary, LocationSummary, Printer, PrinterAssignment, Record,
    RecordFilter,
};
use crate::domain::value_objects::MirroredTable;
use crate::shared::error::AppError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Embedded select used for the printer + active assignment join.
const ASSIGNMENT_EMBED: &str =
    "*, printer_assignments!inner(*, clients(*), departments_location(*))";

/// Printer reads that prefer the remote store and degrade to the local mirror.
///
/// Each call uses exactly one source. Remote results are never written back
/// into the mirror; that is the sync driver's job.
pub struct OfflinePrinterService {
    remote: Arc<dyn RemoteTableStore>,
    store: Arc<dyn LocalStore>,
    connectivity: Arc<dyn ConnectivityProbe>,
}

impl OfflinePrinterService {
    pub fn new(
        remote: Arc<dyn RemoteTableStore>,
        store: Arc<dyn LocalStore>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            remote,
            store,
            connectivity,
        }
    }

    pub async fn get_all_printers(&self) -> Result<Vec<Printer>, AppError> {
        let query = RemoteQuery::new().order_by("name", SortDirection::Ascending);
        if let Some(rows) = self.try_remote(MirroredTable::Printers, &query).await {
            if let Some(printers) = decode_remote::<Printer>(MirroredTable::Printers, rows) {
                return Ok(printers);
            }
        }

        let rows = self.mirror_records(MirroredTable::Printers, None).await?;
        Ok(sorted_by_name(decode_local(MirroredTable::Printers, rows)))
    }

    pub async fn get_available_printers(&self) -> Result<Vec<Printer>, AppError> {
        let query = RemoteQuery::new()
            .eq("is_available", true)
            .order_by("name", SortDirection::Ascending);
        if let Some(rows) = self.try_remote(MirroredTable::Printers, &query).await {
            if let Some(printers) = decode_remote::<Printer>(MirroredTable::Printers, rows) {
                return Ok(printers);
            }
        }

        let filter = RecordFilter::new().eq("is_available", 1);
        let rows = self
            .mirror_records(MirroredTable::Printers, Some(&filter))
            .await?;
        Ok(sorted_by_name(decode_local(MirroredTable::Printers, rows)))
    }

    pub async fn get_printer_by_id(&self, printer_id: &str) -> Result<Option<Printer>, AppError> {
        let query = RemoteQuery::new().eq("id", printer_id);
        if let Some(rows) = self.try_remote(MirroredTable::Printers, &query).await {
            if let Some(printers) = decode_remote::<Printer>(MirroredTable::Printers, rows) {
                return Ok(printers.into_iter().next());
            }
        }

        let filter = RecordFilter::new().eq("id", printer_id);
        let rows = self
            .mirror_records(MirroredTable::Printers, Some(&filter))
            .await?;
        Ok(decode_local::<Printer>(MirroredTable::Printers, rows)
            .into_iter()
            .next())
    }

    /// Printers that currently have an active assignment, with the assigned
    /// client and location when known.
    pub async fn get_printers_with_assignments(&self) -> Result<Vec<AssignedPrinter>, AppError> {
        let query = RemoteQuery::new()
            .select(ASSIGNMENT_EMBED)
            .eq("printer_assignments.is_active", true)
            .order_by("name", SortDirection::Ascending);
        if let Some(rows) = self.try_remote(MirroredTable::Printers, &query).await {
            if let Some(assigned) = flatten_embedded(rows) {
                return Ok(assigned);
            }
        }

        let filter = RecordFilter::new().eq("is_active", 1);
        self.join_locally(&filter).await
    }

    pub async fn get_printers_by_client(
        &self,
        client_id: &str,
    ) -> Result<Vec<AssignedPrinter>, AppError> {
        let query = RemoteQuery::new()
            .select(ASSIGNMENT_EMBED)
            .eq("printer_assignments.client_id", client_id)
            .eq("printer_assignments.is_active", true)
            .order_by("name", SortDirection::Ascending);
        if let Some(rows) = self.try_remote(MirroredTable::Printers, &query).await {
            if let Some(assigned) = flatten_embedded(rows) {
                return Ok(assigned);
            }
        }

        let filter = RecordFilter::new()
            .eq("client_id", client_id)
            .eq("is_active", 1);
        self.join_locally(&filter).await
    }

    /// `None` when offline or when the remote call fails.
    async fn try_remote(&self, table: MirroredTable, query: &RemoteQuery) -> Option<Vec<Record>> {
        if !self.connectivity.is_online() {
            debug!(table = %table, "Offline, reading local mirror");
            return None;
        }
        match self.remote.select(table.as_str(), query).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(table = %table, "Remote read failed, falling back to local mirror: {}", e);
                None
            }
        }
    }

    async fn mirror_records(
        &self,
        table: MirroredTable,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<Record>, AppError> {
        if !self.store.is_ready() {
            self.store.initialize().await?;
        }
        Ok(self
            .store
            .get_records(table, filter)
            .await?
            .unwrap_or_default())
    }

    async fn join_locally(
        &self,
        assignment_filter: &RecordFilter,
    ) -> Result<Vec<AssignedPrinter>, AppError> {
        let assignments: Vec<PrinterAssignment> = decode_local(
            MirroredTable::PrinterAssignments,
            self.mirror_records(MirroredTable::PrinterAssignments, Some(assignment_filter))
                .await?,
        );
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let printers: HashMap<String, Printer> =
            decode_local::<Printer>(
                MirroredTable::Printers,
                self.mirror_records(MirroredTable::Printers, None).await?,
            )
            .into_iter()
            .map(|printer| (printer.id.clone(), printer))
            .collect();
        let clients: HashMap<String, ClientSummary> = decode_local::<ClientSummary>(
            MirroredTable::Clients,
            self.mirror_records(MirroredTable::Clients, None).await?,
        )
        .into_iter()
        .map(|client| (client.id.clone(), client))
        .collect();
        let locations: HashMap<String, LocationSummary> = decode_local::<LocationSummary>(
            MirroredTable::DepartmentsLocation,
            self.mirror_records(MirroredTable::DepartmentsLocation, None)
                .await?,
        )
        .into_iter()
        .map(|location| (location.id.clone(), location))
        .collect();

        let mut joined: Vec<AssignedPrinter> = assignments
            .into_iter()
            .filter_map(|assignment| {
                let printer = printers.get(&assignment.printer_id)?.clone();
                let client = assignment
                    .client_id
                    .as_ref()
                    .and_then(|id| clients.get(id))
                    .cloned();
                let location = assignment
                    .location_id
                    .as_ref()
                    .and_then(|id| locations.get(id))
                    .cloned();
                Some(AssignedPrinter {
                    printer,
                    assignment,
                    client,
                    location,
                })
            })
            .collect();
        joined.sort_by(|a, b| a.printer.name.cmp(&b.printer.name));
        Ok(joined)
    }
}

fn sorted_by_name(mut printers: Vec<Printer>) -> Vec<Printer> {
    printers.sort_by(|a, b| a.name.cmp(&b.name));
    printers
}

/// Decodes remote rows as a whole. A shape mismatch is treated like any other
/// remote failure.
fn decode_remote<T: DeserializeOwned>(table: MirroredTable, rows: Vec<Record>) -> Option<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value::<T>(Value::Object(row)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            warn!(table = %table, "Unexpected remote row shape, falling back: {}", e);
        })
        .ok()
}

/// Decodes mirror rows one by one, skipping rows that no longer fit the model.
fn decode_local<T: DeserializeOwned>(table: MirroredTable, rows: Vec<Record>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(Value::Object(row)) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(table = %table, "Skipping unreadable mirror row: {}", e);
                None
            }
        })
        .collect()
}

/// Turns embedded printer rows (one per printer, assignments nested) into one
/// entry per active assignment.
fn flatten_embedded(rows: Vec<Record>) -> Option<Vec<AssignedPrinter>> {
    let mut assigned = Vec::new();
    for mut row in rows {
        let nested = match row.remove("printer_assignments") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(item)) => vec![Value::Object(item)],
            _ => Vec::new(),
        };
        let printer = decode_remote::<Printer>(MirroredTable::Printers, vec![row])?
            .into_iter()
            .next()?;

        for item in nested {
            let Value::Object(mut item) = item else {
                continue;
            };
            let client = embedded::<ClientSummary>(item.remove("clients"));
            let location = embedded::<LocationSummary>(item.remove("departments_location"));
            let assignment: PrinterAssignment =
                decode_remote::<PrinterAssignment>(MirroredTable::PrinterAssignments, vec![item])?
                    .into_iter()
                    .next()?;
            if !assignment.is_active {
                continue;
            }
            assigned.push(AssignedPrinter {
                printer: printer.clone(),
                assignment,
                client,
                location,
            });
        }
    }
    Some(assigned)
}

fn embedded<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    match value? {
        Value::Null => None,
        other => serde_json::from_value(other).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PendingChange;
    use crate::infrastructure::network::NetworkMonitor;
    use crate::infrastructure::offline::{OfflineStore, OfflineStoreOptions};
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;

    mock! {
        pub Remote {}

        #[async_trait]
        impl RemoteTableStore for Remote {
            async fn select(&self, table: &str, query: &RemoteQuery) -> Result<Vec<Record>, AppError>;
            async fn apply_change(&self, change: &PendingChange) -> Result<(), AppError>;
        }
    }

    fn row(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn seeded_store() -> Arc<OfflineStore> {
        let store = Arc::new(OfflineStore::new(OfflineStoreOptions::in_memory()));
        store.initialize().await.unwrap();
        store
            .bulk_insert(
                MirroredTable::Printers,
                vec![
                    row(json!({"id": "p1", "name": "Zebra ZD420", "is_available": 0})),
                    row(json!({"id": "p2", "name": "Brother HL", "is_available": 1})),
                    row(json!({"id": "p3", "name": "Canon G7020", "is_available": 0})),
                ],
            )
            .await
            .unwrap();
        store
            .bulk_insert(
                MirroredTable::PrinterAssignments,
                vec![
                    row(json!({"id": "a1", "printer_id": "p1", "client_id": "c1", "location_id": "l1", "is_active": 1})),
                    row(json!({"id": "a2", "printer_id": "p3", "client_id": "c2", "is_active": 1})),
                    row(json!({"id": "a3", "printer_id": "p2", "client_id": "c1", "is_active": 0})),
                ],
            )
            .await
            .unwrap();
        store
            .bulk_insert(
                MirroredTable::Clients,
                vec![
                    row(json!({"id": "c1", "name": "Acme"})),
                    row(json!({"id": "c2", "name": "Globex"})),
                ],
            )
            .await
            .unwrap();
        store
            .bulk_insert(
                MirroredTable::DepartmentsLocation,
                vec![row(json!({"id": "l1", "name": "Front desk", "city": "Lima"}))],
            )
            .await
            .unwrap();
        store
    }

    fn failing_remote() -> MockRemote {
        let mut remote = MockRemote::new();
        remote
            .expect_select()
            .returning(|_, _| Err(AppError::Network("connection refused".to_string())));
        remote
    }

    #[tokio::test]
    async fn test_remote_result_is_returned_without_touching_mirror() {
        let store = Arc::new(OfflineStore::new(OfflineStoreOptions::in_memory()));
        let mut remote = MockRemote::new();
        remote
            .expect_select()
            .withf(|table, query| table.to_string() == "printers" && query.filters().is_empty())
            .times(1)
            .returning(|_, _| Ok(vec![row(json!({"id": 9, "name": "Remote", "is_available": true}))]));

        let service = OfflinePrinterService::new(
            Arc::new(remote),
            store.clone(),
            Arc::new(NetworkMonitor::new(true)),
        );
        let printers = service.get_all_printers().await.unwrap();

        assert_eq!(printers.len(), 1);
        assert_eq!(printers[0].id, "9");
        assert!(!store.is_ready());
    }

    #[tokio::test]
    async fn test_available_printers_fall_back_on_remote_error() {
        let store = seeded_store().await;
        let service = OfflinePrinterService::new(
            Arc::new(failing_remote()),
            store,
            Arc::new(NetworkMonitor::new(true)),
        );

        let printers = service.get_available_printers().await.unwrap();

        assert_eq!(printers.len(), 1);
        assert_eq!(printers[0].id, "p2");
        assert!(printers[0].is_available);
    }

    #[tokio::test]
    async fn test_offline_lookup_by_id_never_calls_remote() {
        let store = seeded_store().await;
        let mut remote = MockRemote::new();
        remote.expect_select().times(0);

        let service = OfflinePrinterService::new(
            Arc::new(remote),
            store,
            Arc::new(NetworkMonitor::new(false)),
        );

        let printer = service.get_printer_by_id("p3").await.unwrap();
        assert_eq!(printer.map(|p| p.name), Some("Canon G7020".to_string()));
        assert!(service.get_printer_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_join_keeps_only_active_assignments() {
        let store = seeded_store().await;
        let service = OfflinePrinterService::new(
            Arc::new(failing_remote()),
            store,
            Arc::new(NetworkMonitor::new(true)),
        );

        let assigned = service.get_printers_with_assignments().await.unwrap();

        let ids: Vec<&str> = assigned.iter().map(|a| a.printer.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p1"]);
        let zebra = &assigned[1];
        assert_eq!(zebra.client.as_ref().map(|c| c.name.as_str()), Some("Acme"));
        assert_eq!(
            zebra.location.as_ref().and_then(|l| l.city.as_deref()),
            Some("Lima")
        );
        assert!(assigned[0].location.is_none());
    }

    #[tokio::test]
    async fn test_printers_by_client_offline() {
        let store = seeded_store().await;
        let service = OfflinePrinterService::new(
            Arc::new(MockRemote::new()),
            store,
            Arc::new(NetworkMonitor::new(false)),
        );

        let assigned = service.get_printers_by_client("c1").await.unwrap();

        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].printer.id, "p1");
        assert_eq!(assigned[0].assignment.id, "a1");
    }

    #[tokio::test]
    async fn test_embedded_remote_rows_are_flattened() {
        let store = Arc::new(OfflineStore::new(OfflineStoreOptions::in_memory()));
        let mut remote = MockRemote::new();
        remote
            .expect_select()
            .withf(|_, query| query.projection() == ASSIGNMENT_EMBED)
            .returning(|_, _| {
                Ok(vec![row(json!({
                    "id": 1,
                    "name": "HP LaserJet",
                    "is_available": false,
                    "printer_assignments": [{
                        "id": 10,
                        "printer_id": 1,
                        "client_id": 5,
                        "is_active": true,
                        "clients": {"id": 5, "name": "Initech"},
                        "departments_location": null
                    }]
                }))])
            });

        let service = OfflinePrinterService::new(
            Arc::new(remote),
            store,
            Arc::new(NetworkMonitor::new(true)),
        );
        let assigned = service.get_printers_with_assignments().await.unwrap();

        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].assignment.client_id.as_deref(), Some("5"));
        assert_eq!(
            assigned[0].client.as_ref().map(|c| c.name.as_str()),
            Some("Initech")
        );
        assert!(assigned[0].location.is_none());
    }

    #[tokio::test]
    async fn test_fallback_initializes_store_lazily() {
        let store = Arc::new(OfflineStore::new(OfflineStoreOptions::in_memory()));
        let service = OfflinePrinterService::new(
            Arc::new(MockRemote::new()),
            store.clone(),
            Arc::new(NetworkMonitor::new(false)),
        );

        let printers = service.get_all_printers().await.unwrap();

        assert!(printers.is_empty());
        assert!(store.is_ready());
    }
}
