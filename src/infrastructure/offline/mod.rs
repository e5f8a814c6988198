pub mod backend;
pub mod key_value_backend;
mod queries;
mod rows;
mod schema;
pub mod sqlite_backend;
pub mod store;

pub use backend::{StorageBackend, BULK_INSERT_BATCH_SIZE};
pub use key_value_backend::KeyValueBackend;
pub use sqlite_backend::SqliteBackend;
pub use store::{OfflineStore, OfflineStoreOptions, KEY_VALUE_FILE_NAME};
