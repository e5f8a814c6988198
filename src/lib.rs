pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::{
    BackendKind, ConnectivityProbe, KeyValueStore, LocalStore, RemoteQuery, RemoteTableStore,
    StoreOutcome, StoreWrite,
};
pub use application::services::{MirrorSyncService, OfflinePrinterService};
pub use domain::entities::{PendingChange, Record, RecordFilter, SyncMetadataRecord, SyncMetadataUpdate};
pub use domain::value_objects::{ChangeOperation, MirroredTable, PendingChangeId, SyncStatus};
pub use infrastructure::{
    FileKeyValueStore, MemoryKeyValueStore, NetworkMonitor, OfflineStore, OfflineStoreOptions,
    RestTableStore,
};
pub use shared::{init_logging, AppConfig, AppError, StorageMode};
pub use state::AppState;
