use crate::application::ports::BackendKind;
use crate::domain::entities::{PendingChange, Record, RecordFilter, SyncMetadataRecord, SyncMetadataUpdate};
use crate::domain::value_objects::{MirroredTable, PendingChangeId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Mirrored rows are upserted in chunks of this size.
pub const BULK_INSERT_BATCH_SIZE: usize = 100;

/// A concrete backing for [`super::OfflineStore`]. Implementations assume the
/// store is ready; readiness is handled one level up.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn repair(&self) -> Result<(), AppError>;

    async fn sync_metadata(&self) -> Result<Vec<SyncMetadataRecord>, AppError>;

    /// Returns the number of ledger rows touched (0 for an unknown table).
    async fn update_sync_metadata(
        &self,
        table: MirroredTable,
        update: &SyncMetadataUpdate,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    async fn append_change(&self, change: &PendingChange) -> Result<(), AppError>;

    /// Unsynced changes, oldest first.
    async fn unsynced_changes(&self) -> Result<Vec<PendingChange>, AppError>;

    async fn mark_synced(&self, change_id: &PendingChangeId) -> Result<u64, AppError>;

    async fn purge_synced(&self) -> Result<u64, AppError>;

    /// Replaces every row of `table` with `records`.
    async fn replace_all(&self, table: MirroredTable, records: &[Record]) -> Result<u64, AppError>;

    async fn clear(&self, table: MirroredTable) -> Result<u64, AppError>;

    async fn records(
        &self,
        table: MirroredTable,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, AppError>;

    async fn execute(&self, query: &str, values: &[Value]) -> Result<u64, AppError>;

    async fn close(&self);
}

/// Rejects batches containing rows without a usable primary key, before any
/// existing row is touched.
pub(crate) fn ensure_primary_keys(table: MirroredTable, records: &[Record]) -> Result<(), AppError> {
    match records
        .iter()
        .position(|record| crate::domain::entities::record::record_id(record).is_none())
    {
        Some(index) => Err(AppError::InvalidInput(format!(
            "Record #{index} for {table} has no primary key"
        ))),
        None => Ok(()),
    }
}
