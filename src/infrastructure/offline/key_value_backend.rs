use super::backend::{ensure_primary_keys, StorageBackend};
use crate::application::ports::{BackendKind, KeyValueStore};
use crate::domain::entities::record::record_id;
use crate::domain::entities::{PendingChange, Record, RecordFilter, SyncMetadataRecord, SyncMetadataUpdate};
use crate::domain::value_objects::{MirroredTable, PendingChangeId, SyncStatus};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PENDING_CHANGES_KEY: &str = "pending_changes";

const FIELD_LAST_SYNC: &str = "last_sync";
const FIELD_STATUS: &str = "status";
const FIELD_RECORD_COUNT: &str = "record_count";
const FIELD_ERROR_MESSAGE: &str = "error_message";

/// Fallback backing for platforms without an embedded relational engine.
///
/// Whole tables are stored as JSON arrays under `table_{name}`, ledger fields
/// as scalars under `sync_{table}_{field}` and the change queue as one JSON
/// array. A table "exists" in the ledger once its status key is present.
pub struct KeyValueBackend {
    store: Arc<dyn KeyValueStore>,
}

impl KeyValueBackend {
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let backend = Self { store };
        backend.seed_sync_metadata().await?;
        info!("Offline key/value store ready");
        Ok(backend)
    }

    fn table_key(table: MirroredTable) -> String {
        format!("table_{}", table.as_str())
    }

    fn metadata_key(table: MirroredTable, field: &str) -> String {
        format!("sync_{}_{}", table.as_str(), field)
    }

    async fn seed_sync_metadata(&self) -> Result<(), AppError> {
        for table in MirroredTable::ALL {
            let status_key = Self::metadata_key(table, FIELD_STATUS);
            if self.store.get(&status_key).await?.is_none() {
                self.store
                    .set(&status_key, SyncStatus::Pending.as_str())
                    .await?;
            }
        }
        Ok(())
    }

    async fn load_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, AppError> {
        match self.store.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|err| AppError::DeserializationError(format!("{key}: {err}"))),
            None => Ok(T::default()),
        }
    }

    async fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;
        self.store.set(key, &json).await
    }

    async fn load_changes(&self) -> Result<Vec<PendingChange>, AppError> {
        self.load_json(PENDING_CHANGES_KEY).await
    }

    async fn metadata_for(&self, table: MirroredTable) -> Result<Option<SyncMetadataRecord>, AppError> {
        let Some(status) = self
            .store
            .get(&Self::metadata_key(table, FIELD_STATUS))
            .await?
        else {
            return Ok(None);
        };

        let mut record = SyncMetadataRecord::initial(table);
        record.status = status
            .parse::<SyncStatus>()
            .map_err(AppError::DeserializationError)?;

        if let Some(raw) = self
            .store
            .get(&Self::metadata_key(table, FIELD_LAST_SYNC))
            .await?
        {
            let millis = raw
                .parse::<i64>()
                .map_err(|err| AppError::DeserializationError(format!("last_sync: {err}")))?;
            record.last_sync = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
                AppError::DeserializationError(format!("Invalid last_sync timestamp: {millis}"))
            })?;
        }
        if let Some(raw) = self
            .store
            .get(&Self::metadata_key(table, FIELD_RECORD_COUNT))
            .await?
        {
            record.record_count = raw
                .parse::<u64>()
                .map_err(|err| AppError::DeserializationError(format!("record_count: {err}")))?;
        }
        record.error_message = self
            .store
            .get(&Self::metadata_key(table, FIELD_ERROR_MESSAGE))
            .await?;

        Ok(Some(record))
    }
}

/// Keeps only the mirrored columns that are present, with the key normalized to text.
fn project(table: MirroredTable, record: &Record) -> Record {
    let mut projected = Record::new();
    for column in table.columns() {
        if column.name == MirroredTable::PRIMARY_KEY {
            if let Some(id) = record_id(record) {
                projected.insert(column.name.to_string(), Value::String(id));
            }
        } else if let Some(value) = record.get(column.name) {
            projected.insert(column.name.to_string(), value.clone());
        }
    }
    projected
}

/// Aligns a filter with how rows are stored: ids compare as text, and a
/// condition on a column the table does not have matches nothing.
fn normalize_filter(table: MirroredTable, filter: &RecordFilter) -> Option<RecordFilter> {
    let mut normalized = RecordFilter::new();
    for (column, value) in filter.conditions() {
        if !table.has_column(column) {
            debug!(table = %table, column = %column, "Condition on unknown column matches nothing");
            return None;
        }
        let value = match value {
            Value::Number(n) if column == MirroredTable::PRIMARY_KEY => Value::String(n.to_string()),
            other => other.clone(),
        };
        normalized = normalized.eq(column.clone(), value);
    }
    Some(normalized)
}

#[async_trait]
impl StorageBackend for KeyValueBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn repair(&self) -> Result<(), AppError> {
        debug!("Key/value store has no schema to repair");
        Ok(())
    }

    async fn sync_metadata(&self) -> Result<Vec<SyncMetadataRecord>, AppError> {
        let mut tables = MirroredTable::ALL.to_vec();
        tables.sort_by_key(|table| table.as_str());

        let mut records = Vec::with_capacity(tables.len());
        for table in tables {
            if let Some(record) = self.metadata_for(table).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn update_sync_metadata(
        &self,
        table: MirroredTable,
        update: &SyncMetadataUpdate,
        _now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let status_key = Self::metadata_key(table, FIELD_STATUS);
        if self.store.get(&status_key).await?.is_none() {
            debug!(table = %table, "No sync metadata for table, update ignored");
            return Ok(0);
        }

        if let Some(last_sync) = update.last_sync {
            self.store
                .set(
                    &Self::metadata_key(table, FIELD_LAST_SYNC),
                    &last_sync.timestamp_millis().to_string(),
                )
                .await?;
        }
        if let Some(status) = update.status {
            self.store.set(&status_key, status.as_str()).await?;
        }
        if let Some(record_count) = update.record_count {
            self.store
                .set(
                    &Self::metadata_key(table, FIELD_RECORD_COUNT),
                    &record_count.to_string(),
                )
                .await?;
        }
        match &update.error_message {
            Some(Some(message)) => {
                self.store
                    .set(&Self::metadata_key(table, FIELD_ERROR_MESSAGE), message)
                    .await?
            }
            Some(None) => {
                self.store
                    .remove(&Self::metadata_key(table, FIELD_ERROR_MESSAGE))
                    .await?
            }
            None => {}
        }
        Ok(1)
    }

    async fn append_change(&self, change: &PendingChange) -> Result<(), AppError> {
        let mut changes = self.load_changes().await?;
        if changes.iter().any(|existing| existing.id == change.id) {
            return Err(AppError::InvalidInput(format!(
                "Pending change {} already exists",
                change.id
            )));
        }
        changes.push(change.clone());
        self.save_json(PENDING_CHANGES_KEY, &changes).await
    }

    async fn unsynced_changes(&self) -> Result<Vec<PendingChange>, AppError> {
        let mut changes: Vec<PendingChange> = self
            .load_changes()
            .await?
            .into_iter()
            .filter(|change| !change.synced)
            .collect();
        // Stable, so equal timestamps keep append order.
        changes.sort_by_key(|change| change.created_at);
        Ok(changes)
    }

    async fn mark_synced(&self, change_id: &PendingChangeId) -> Result<u64, AppError> {
        let mut changes = self.load_changes().await?;
        let Some(change) = changes
            .iter_mut()
            .find(|change| &change.id == change_id && !change.synced)
        else {
            return Ok(0);
        };
        change.synced = true;
        self.save_json(PENDING_CHANGES_KEY, &changes).await?;
        Ok(1)
    }

    async fn purge_synced(&self) -> Result<u64, AppError> {
        let changes = self.load_changes().await?;
        let before = changes.len();
        let retained: Vec<PendingChange> = changes.into_iter().filter(|c| !c.synced).collect();
        let removed = (before - retained.len()) as u64;
        if removed > 0 {
            self.save_json(PENDING_CHANGES_KEY, &retained).await?;
        }
        Ok(removed)
    }

    async fn replace_all(&self, table: MirroredTable, records: &[Record]) -> Result<u64, AppError> {
        ensure_primary_keys(table, records)?;
        let projected: Vec<Record> = records.iter().map(|record| project(table, record)).collect();
        self.save_json(&Self::table_key(table), &projected).await?;
        debug!(table = %table, count = projected.len(), "Mirrored table replaced");
        Ok(projected.len() as u64)
    }

    async fn clear(&self, table: MirroredTable) -> Result<u64, AppError> {
        let key = Self::table_key(table);
        let rows: Vec<Record> = self.load_json(&key).await?;
        self.store.remove(&key).await?;
        Ok(rows.len() as u64)
    }

    async fn records(
        &self,
        table: MirroredTable,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, AppError> {
        let Some(filter) = normalize_filter(table, filter) else {
            return Ok(Vec::new());
        };
        let rows: Vec<Record> = self.load_json(&Self::table_key(table)).await?;
        Ok(rows.into_iter().filter(|row| filter.matches(row)).collect())
    }

    async fn execute(&self, query: &str, _values: &[Value]) -> Result<u64, AppError> {
        warn!(query = %query, "Raw queries are not supported by the key/value store, skipped");
        Ok(0)
    }

    async fn close(&self) {
        debug!("Key/value store released");
    }
}
