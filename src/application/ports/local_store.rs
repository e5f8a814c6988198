use crate::domain::entities::{PendingChange, Record, RecordFilter, SyncMetadataRecord, SyncMetadataUpdate};
use crate::domain::value_objects::{ChangeOperation, MirroredTable, PendingChangeId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Result of a store call that distinguishes "store not initialized yet" from
/// a legitimately empty answer.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome<T> {
    Ready(T),
    NotReady,
}

impl<T> StoreOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, StoreOutcome::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            StoreOutcome::Ready(value) => Some(value),
            StoreOutcome::NotReady => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StoreOutcome<U> {
        match self {
            StoreOutcome::Ready(value) => StoreOutcome::Ready(f(value)),
            StoreOutcome::NotReady => StoreOutcome::NotReady,
        }
    }
}

impl<T: Default> StoreOutcome<T> {
    /// Collapses `NotReady` into the empty value callers historically relied on.
    pub fn unwrap_or_default(self) -> T {
        self.ready().unwrap_or_default()
    }
}

/// Rows touched by a mutating call.
pub type StoreWrite = StoreOutcome<u64>;

/// Which concrete backing serves the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    KeyValue,
}

/// Local mirror of the server tables plus the sync ledger and change queue.
///
/// Every data method answers `NotReady` instead of failing when called before
/// [`LocalStore::initialize`].
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn initialize(&self) -> Result<(), AppError>;
    async fn repair_database(&self) -> Result<(), AppError>;
    async fn get_sync_metadata(&self) -> Result<StoreOutcome<Vec<SyncMetadataRecord>>, AppError>;
    async fn update_sync_metadata(
        &self,
        table: MirroredTable,
        update: SyncMetadataUpdate,
    ) -> Result<StoreWrite, AppError>;
    async fn add_pending_change(
        &self,
        table: MirroredTable,
        record_id: &str,
        operation: ChangeOperation,
        data: Value,
    ) -> Result<StoreOutcome<PendingChangeId>, AppError>;
    async fn get_pending_changes(&self) -> Result<StoreOutcome<Vec<PendingChange>>, AppError>;
    async fn mark_change_as_synced(&self, change_id: &PendingChangeId)
        -> Result<StoreWrite, AppError>;
    async fn purge_synced_changes(&self) -> Result<StoreWrite, AppError>;
    async fn bulk_insert(
        &self,
        table: MirroredTable,
        records: Vec<Record>,
    ) -> Result<StoreWrite, AppError>;
    /// Removes every row of `table`, returning how many were removed.
    async fn clear_table(&self, table: MirroredTable) -> Result<StoreWrite, AppError>;
    async fn get_records(
        &self,
        table: MirroredTable,
        conditions: Option<&RecordFilter>,
    ) -> Result<StoreOutcome<Vec<Record>>, AppError>;
    async fn execute_query(&self, query: &str, values: &[Value]) -> Result<StoreWrite, AppError>;
    async fn close(&self);
    fn is_ready(&self) -> bool;
    async fn backend_kind(&self) -> Option<BackendKind>;
}
