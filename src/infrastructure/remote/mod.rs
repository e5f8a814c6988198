pub mod rest_table_store;

pub use rest_table_store::RestTableStore;
