#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use printdesk_offline::application::ports::{LocalStore, RemoteQuery, RemoteTableStore};
use printdesk_offline::domain::entities::{PendingChange, Record};
use printdesk_offline::infrastructure::offline::{OfflineStore, OfflineStoreOptions};
use printdesk_offline::infrastructure::storage::MemoryKeyValueStore;
use printdesk_offline::shared::config::StorageMode;
use printdesk_offline::shared::error::AppError;
use serde_json::{json, Value};
use std::sync::Arc;

mock! {
    pub Remote {}

    #[async_trait]
    impl RemoteTableStore for Remote {
        async fn select(&self, table: &str, query: &RemoteQuery) -> Result<Vec<Record>, AppError>;
        async fn apply_change(&self, change: &PendingChange) -> Result<(), AppError>;
    }
}

/// Both backings, uninitialized, each with private storage.
pub fn all_backings() -> Vec<(&'static str, Arc<OfflineStore>)> {
    vec![
        ("sqlite", Arc::new(OfflineStore::new(OfflineStoreOptions::in_memory()))),
        ("key_value", key_value_store()),
    ]
}

pub fn key_value_store() -> Arc<OfflineStore> {
    let options = OfflineStoreOptions::in_memory()
        .with_mode(StorageMode::KeyValue)
        .with_key_value_store(Arc::new(MemoryKeyValueStore::new()));
    Arc::new(OfflineStore::new(options))
}

pub async fn initialized_sqlite_store() -> Arc<OfflineStore> {
    let store = Arc::new(OfflineStore::new(OfflineStoreOptions::in_memory()));
    store.initialize().await.expect("initialize store");
    store
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("record must be a JSON object")
}

pub fn printer(id: &str, name: &str, available: bool) -> Record {
    record(json!({
        "id": id,
        "name": name,
        "brand": "Brother",
        "is_available": if available { 1 } else { 0 },
    }))
}

pub fn failing_remote() -> MockRemote {
    let mut remote = MockRemote::new();
    remote
        .expect_select()
        .returning(|_, _| Err(AppError::Network("connection reset by peer".to_string())));
    remote
}

pub fn ids(records: &[Record]) -> Vec<String> {
    let mut ids: Vec<String> = records
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_str).map(str::to_string))
        .collect();
    ids.sort();
    ids
}

pub async fn store_records(store: &dyn LocalStore, table: printdesk_offline::MirroredTable) -> Vec<Record> {
    store
        .get_records(table, None)
        .await
        .expect("get records")
        .unwrap_or_default()
}
