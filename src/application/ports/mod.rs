pub mod connectivity;
pub mod key_value_store;
pub mod local_store;
pub mod remote_store;

pub use connectivity::ConnectivityProbe;
pub use key_value_store::KeyValueStore;
pub use local_store::{BackendKind, LocalStore, StoreOutcome, StoreWrite};
pub use remote_store::{RemoteQuery, RemoteTableStore, SortDirection};
