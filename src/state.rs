use crate::application::ports::{ConnectivityProbe, LocalStore, RemoteTableStore};
use crate::application::services::{MirrorSyncService, OfflinePrinterService};
use crate::infrastructure::network::NetworkMonitor;
use crate::infrastructure::offline::OfflineStore;
use crate::infrastructure::remote::RestTableStore;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

/// Wires the store, the remote adapter and the services for one process.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<OfflineStore>,
    pub network: Arc<NetworkMonitor>,
    pub printers: Arc<OfflinePrinterService>,
    pub sync: Arc<MirrorSyncService>,
    auto_sync: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AppState {
    /// Builds the state from configuration, talking to the configured REST endpoint.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let remote = RestTableStore::from_config(&config.remote)?.ok_or_else(|| {
            AppError::ConfigurationError("Remote base URL is not configured".to_string())
        })?;
        Self::new(config, Arc::new(remote)).await
    }

    /// Builds the state around an existing remote adapter and initializes the store.
    pub async fn new(
        config: AppConfig,
        remote: Arc<dyn RemoteTableStore>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let store = Arc::new(OfflineStore::from_config(&config));
        store.initialize().await?;

        let network = Arc::new(NetworkMonitor::default());
        let local: Arc<dyn LocalStore> = store.clone();
        let probe: Arc<dyn ConnectivityProbe> = network.clone();

        let printers = Arc::new(OfflinePrinterService::new(
            remote.clone(),
            local.clone(),
            probe.clone(),
        ));
        let sync = Arc::new(
            MirrorSyncService::new(remote, local, probe).with_batch_size(config.sync.batch_size),
        );

        info!("Offline state ready");

        Ok(Self {
            config,
            store,
            network,
            printers,
            sync,
            auto_sync: Arc::new(Mutex::new(None)),
        })
    }

    /// Starts the periodic sync when enabled in configuration. Returns whether
    /// a loop is running afterwards.
    pub async fn start_auto_sync(&self) -> bool {
        if !self.config.sync.auto_sync {
            return false;
        }
        let mut slot = self.auto_sync.lock().await;
        if slot.is_none() {
            *slot = Some(self.sync.schedule_sync(self.config.sync.sync_interval));
            info!(
                "Auto sync scheduled every {}s",
                self.config.sync.sync_interval
            );
        }
        true
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = self.auto_sync.lock().await.take() {
            handle.abort();
        }
        self.store.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{PendingChange, Record};
    use crate::application::ports::RemoteQuery;
    use crate::shared::config::StorageMode;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub Remote {}

        #[async_trait]
        impl RemoteTableStore for Remote {
            async fn select(&self, table: &str, query: &RemoteQuery) -> Result<Vec<Record>, AppError>;
            async fn apply_change(&self, change: &PendingChange) -> Result<(), AppError>;
        }
    }

    fn in_memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.storage.mode = StorageMode::Sqlite;
        config
    }

    #[tokio::test]
    async fn test_state_initializes_store() {
        let state = AppState::new(in_memory_config(), Arc::new(MockRemote::new()))
            .await
            .unwrap();

        assert!(state.store.is_ready());
        assert!(state.network.is_online());

        state.shutdown().await;
        assert!(!state.store.is_ready());
    }

    #[tokio::test]
    async fn test_auto_sync_respects_config() {
        let mut config = in_memory_config();
        config.sync.auto_sync = false;
        let state = AppState::new(config, Arc::new(MockRemote::new()))
            .await
            .unwrap();

        assert!(!state.start_auto_sync().await);
    }

    #[tokio::test]
    async fn test_missing_remote_url_is_a_configuration_error() {
        let mut config = in_memory_config();
        config.remote.base_url = None;

        let result = AppState::from_config(config).await;
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = in_memory_config();
        config.sync.batch_size = 0;

        let result = AppState::new(config, Arc::new(MockRemote::new())).await;
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }
}
