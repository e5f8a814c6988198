use super::backend::StorageBackend;
use super::key_value_backend::KeyValueBackend;
use super::sqlite_backend::SqliteBackend;
use crate::application::ports::{
    BackendKind, KeyValueStore, LocalStore, StoreOutcome, StoreWrite,
};
use crate::domain::entities::{PendingChange, Record, RecordFilter, SyncMetadataRecord, SyncMetadataUpdate};
use crate::domain::value_objects::{ChangeOperation, MirroredTable, PendingChangeId};
use crate::infrastructure::storage::FileKeyValueStore;
use crate::shared::config::{AppConfig, StorageMode};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// File name of the key/value fallback inside the data directory.
pub const KEY_VALUE_FILE_NAME: &str = "printdesk-offline.json";

const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// How an [`OfflineStore`] picks and opens its backing.
#[derive(Clone)]
pub struct OfflineStoreOptions {
    pub database_url: String,
    pub max_connections: u32,
    /// How long a caller waits for a pooled SQLite connection.
    pub connection_timeout: Duration,
    pub mode: StorageMode,
    pub data_dir: PathBuf,
    /// Used instead of the on-disk file when the key/value backing is selected.
    pub key_value_store: Option<Arc<dyn KeyValueStore>>,
}

impl OfflineStoreOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            database_url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            connection_timeout: Duration::from_secs(config.database.connection_timeout),
            mode: config.storage.mode,
            data_dir: PathBuf::from(&config.storage.data_dir),
            key_value_store: None,
        }
    }

    /// A private in-memory SQLite database.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            mode: StorageMode::Sqlite,
            data_dir: std::env::temp_dir(),
            key_value_store: None,
        }
    }

    pub fn with_mode(mut self, mode: StorageMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(store);
        self
    }
}

/// The local store used by the rest of the application.
///
/// Until [`LocalStore::initialize`] succeeds, every data call answers
/// `NotReady` and has no side effects.
pub struct OfflineStore {
    options: OfflineStoreOptions,
    backend: RwLock<Option<Arc<dyn StorageBackend>>>,
    ready: AtomicBool,
    last_change_millis: AtomicI64,
}

impl OfflineStore {
    pub fn new(options: OfflineStoreOptions) -> Self {
        Self {
            options,
            backend: RwLock::new(None),
            ready: AtomicBool::new(false),
            last_change_millis: AtomicI64::new(i64::MIN),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(OfflineStoreOptions::from_config(config))
    }

    async fn current_backend(&self) -> Option<Arc<dyn StorageBackend>> {
        self.backend.read().await.clone()
    }

    async fn open_backend(&self) -> Result<Arc<dyn StorageBackend>, AppError> {
        match self.options.mode {
            StorageMode::Sqlite => Ok(Arc::new(self.open_sqlite().await?)),
            StorageMode::KeyValue => Ok(Arc::new(self.open_key_value().await?)),
            StorageMode::Auto => {
                if !sqlite_supported() {
                    info!("Embedded SQLite unavailable on this platform, using key/value store");
                    return Ok(Arc::new(self.open_key_value().await?));
                }
                match self.open_sqlite().await {
                    Ok(backend) => Ok(Arc::new(backend)),
                    Err(e) => {
                        warn!("SQLite store failed to open, falling back to key/value: {}", e);
                        Ok(Arc::new(self.open_key_value().await?))
                    }
                }
            }
        }
    }

    async fn open_sqlite(&self) -> Result<SqliteBackend, AppError> {
        SqliteBackend::open(
            &self.options.database_url,
            self.options.max_connections,
            self.options.connection_timeout,
        )
        .await
    }

    async fn open_key_value(&self) -> Result<KeyValueBackend, AppError> {
        let store: Arc<dyn KeyValueStore> = match &self.options.key_value_store {
            Some(store) => store.clone(),
            None => Arc::new(
                FileKeyValueStore::open(self.options.data_dir.join(KEY_VALUE_FILE_NAME)).await?,
            ),
        };
        KeyValueBackend::open(store).await
    }

    /// Timestamp for a new change, strictly greater than every earlier one so
    /// ids stay unique and queue order matches call order.
    fn next_change_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_millis();
        let mut previous = self.last_change_millis.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(previous.saturating_add(1));
            match self.last_change_millis.compare_exchange(
                previous,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    return DateTime::<Utc>::from_timestamp_millis(candidate)
                        .unwrap_or_else(Utc::now)
                }
                Err(actual) => previous = actual,
            }
        }
    }
}

fn sqlite_supported() -> bool {
    cfg!(not(target_arch = "wasm32"))
}

#[async_trait]
impl LocalStore for OfflineStore {
    async fn initialize(&self) -> Result<(), AppError> {
        let mut slot = self.backend.write().await;
        if slot.is_some() {
            debug!("Offline store already initialized");
            return Ok(());
        }

        let backend = self.open_backend().await.map_err(|e| {
            error!("Failed to initialize offline store: {}", e);
            e
        })?;
        info!("Offline store initialized with {:?} backing", backend.kind());
        *slot = Some(backend);
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn repair_database(&self) -> Result<(), AppError> {
        let Some(backend) = self.current_backend().await else {
            debug!("Repair requested before initialization, initializing instead");
            return self.initialize().await;
        };
        backend.repair().await?;
        info!("Offline store repaired");
        Ok(())
    }

    async fn get_sync_metadata(&self) -> Result<StoreOutcome<Vec<SyncMetadataRecord>>, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        Ok(StoreOutcome::Ready(backend.sync_metadata().await?))
    }

    async fn update_sync_metadata(
        &self,
        table: MirroredTable,
        update: SyncMetadataUpdate,
    ) -> Result<StoreWrite, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        let touched = backend
            .update_sync_metadata(table, &update, Utc::now())
            .await?;
        debug!(table = %table, touched, "Sync metadata updated");
        Ok(StoreOutcome::Ready(touched))
    }

    async fn add_pending_change(
        &self,
        table: MirroredTable,
        record_id: &str,
        operation: ChangeOperation,
        data: Value,
    ) -> Result<StoreOutcome<PendingChangeId>, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        if record_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Pending change requires a record id".to_string(),
            ));
        }

        let change = PendingChange::new(
            table,
            record_id.to_string(),
            operation,
            data,
            self.next_change_timestamp(),
        );
        backend.append_change(&change).await?;
        debug!(id = %change.id, operation = %operation, "Pending change queued");
        Ok(StoreOutcome::Ready(change.id))
    }

    async fn get_pending_changes(&self) -> Result<StoreOutcome<Vec<PendingChange>>, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        Ok(StoreOutcome::Ready(backend.unsynced_changes().await?))
    }

    async fn mark_change_as_synced(
        &self,
        change_id: &PendingChangeId,
    ) -> Result<StoreWrite, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        Ok(StoreOutcome::Ready(backend.mark_synced(change_id).await?))
    }

    async fn purge_synced_changes(&self) -> Result<StoreWrite, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        let removed = backend.purge_synced().await?;
        if removed > 0 {
            info!("Purged {} synced changes", removed);
        }
        Ok(StoreOutcome::Ready(removed))
    }

    async fn bulk_insert(
        &self,
        table: MirroredTable,
        records: Vec<Record>,
    ) -> Result<StoreWrite, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        if records.is_empty() {
            debug!(table = %table, "Empty bulk insert ignored");
            return Ok(StoreOutcome::Ready(0));
        }
        let written = backend.replace_all(table, &records).await?;
        Ok(StoreOutcome::Ready(written))
    }

    async fn clear_table(&self, table: MirroredTable) -> Result<StoreWrite, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        let removed = backend.clear(table).await?;
        debug!(table = %table, removed, "Mirrored table cleared");
        Ok(StoreOutcome::Ready(removed))
    }

    async fn get_records(
        &self,
        table: MirroredTable,
        conditions: Option<&RecordFilter>,
    ) -> Result<StoreOutcome<Vec<Record>>, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        let everything = RecordFilter::new();
        let filter = conditions.unwrap_or(&everything);
        Ok(StoreOutcome::Ready(backend.records(table, filter).await?))
    }

    async fn execute_query(&self, query: &str, values: &[Value]) -> Result<StoreWrite, AppError> {
        let Some(backend) = self.current_backend().await else {
            return Ok(StoreOutcome::NotReady);
        };
        Ok(StoreOutcome::Ready(backend.execute(query, values).await?))
    }

    async fn close(&self) {
        let backend = self.backend.write().await.take();
        self.ready.store(false, Ordering::SeqCst);
        if let Some(backend) = backend {
            backend.close().await;
            info!("Offline store closed");
        }
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn backend_kind(&self) -> Option<BackendKind> {
        self.current_backend().await.map(|backend| backend.kind())
    }
}
