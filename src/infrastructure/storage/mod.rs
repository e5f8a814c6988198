pub mod file_kv;
pub mod memory_kv;

pub use file_kv::FileKeyValueStore;
pub use memory_kv::MemoryKeyValueStore;
