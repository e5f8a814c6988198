pub mod network;
pub mod offline;
pub mod remote;
pub mod storage;

pub use network::NetworkMonitor;
pub use offline::{OfflineStore, OfflineStoreOptions};
pub use remote::RestTableStore;
pub use storage::{FileKeyValueStore, MemoryKeyValueStore};
