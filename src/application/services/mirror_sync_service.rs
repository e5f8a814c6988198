use crate::application::ports::{ConnectivityProbe, LocalStore, RemoteQuery, RemoteTableStore, StoreOutcome};
use crate::domain::entities::{
    ReplayResult, SyncMetadataUpdate, SyncReport, SyncStatusSummary, TableSyncOutcome,
};
use crate::domain::value_objects::{MirroredTable, SyncStatus};
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Upper bound on changes pushed per replay unless configured otherwise.
pub const DEFAULT_REPLAY_BATCH_SIZE: u32 = 100;

/// Drives the mirror: pulls whole tables from the remote store into the local
/// store and pushes queued local writes back.
#[derive(Clone)]
pub struct MirrorSyncService {
    remote: Arc<dyn RemoteTableStore>,
    store: Arc<dyn LocalStore>,
    connectivity: Arc<dyn ConnectivityProbe>,
    batch_size: u32,
}

impl MirrorSyncService {
    pub fn new(
        remote: Arc<dyn RemoteTableStore>,
        store: Arc<dyn LocalStore>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            remote,
            store,
            connectivity,
            batch_size: DEFAULT_REPLAY_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn ensure_store(&self) -> Result<(), AppError> {
        if !self.store.is_ready() {
            self.store.initialize().await?;
        }
        Ok(())
    }

    /// Replaces the local copy of `table` with the remote rows and records the
    /// outcome in the sync ledger. Remote failures are recorded, not returned.
    pub async fn refresh_table(&self, table: MirroredTable) -> Result<TableSyncOutcome, AppError> {
        if !self.connectivity.is_online() {
            debug!(table = %table, "Offline, refresh skipped");
            return Ok(TableSyncOutcome::skipped(table));
        }
        self.ensure_store().await?;

        let pulled = self.remote.select(table.as_str(), &RemoteQuery::new()).await;
        let written = match pulled {
            // An empty bulk insert keeps the old rows, so an empty table is cleared.
            Ok(rows) if rows.is_empty() => self
                .store
                .clear_table(table)
                .await
                .map(|cleared| cleared.map(|_| 0)),
            Ok(rows) => self.store.bulk_insert(table, rows).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(StoreOutcome::Ready(count)) => {
                self.store
                    .update_sync_metadata(
                        table,
                        SyncMetadataUpdate::new()
                            .last_sync(Utc::now())
                            .status(SyncStatus::Synced)
                            .record_count(count)
                            .clear_error(),
                    )
                    .await?;
                info!(table = %table, count, "Mirror table refreshed");
                Ok(TableSyncOutcome::synced(table, count))
            }
            Ok(StoreOutcome::NotReady) => Ok(TableSyncOutcome::skipped(table)),
            Err(e) => {
                let message = e.to_string();
                warn!(table = %table, "Mirror refresh failed: {}", message);
                self.store
                    .update_sync_metadata(
                        table,
                        SyncMetadataUpdate::new()
                            .status(SyncStatus::Error)
                            .error_message(message.clone()),
                    )
                    .await?;
                Ok(TableSyncOutcome::failed(table, message))
            }
        }
    }

    pub async fn refresh_all(&self) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::default();
        for table in MirroredTable::ALL {
            report.outcomes.push(self.refresh_table(table).await?);
        }
        info!(
            "Mirror refresh finished: {} synced, {} failed, {} skipped",
            report.synced_tables(),
            report.failed_tables(),
            report.skipped_tables()
        );
        Ok(report)
    }

    /// Pushes up to `batch_size` queued changes oldest first, stopping at the
    /// first failure so later changes never overtake an earlier one.
    pub async fn replay_pending_changes(&self) -> Result<ReplayResult, AppError> {
        let mut result = ReplayResult::default();
        if !self.connectivity.is_online() {
            debug!("Offline, replay skipped");
            let pending = self.store.get_pending_changes().await?.unwrap_or_default();
            result.pending_count = pending.len() as u32;
            return Ok(result);
        }
        self.ensure_store().await?;

        let changes = self.store.get_pending_changes().await?.unwrap_or_default();
        let total = changes.len() as u32;
        for change in changes.into_iter().take(self.batch_size as usize) {
            match self.remote.apply_change(&change).await {
                Ok(()) => {
                    self.store.mark_change_as_synced(&change.id).await?;
                    result.synced_count += 1;
                }
                Err(e) => {
                    error!(id = %change.id, "Failed to push pending change: {}", e);
                    result.failed_count = 1;
                    break;
                }
            }
        }
        result.pending_count = total - result.synced_count;

        if result.synced_count > 0 {
            info!("Pushed {} pending changes", result.synced_count);
        }
        Ok(result)
    }

    pub async fn sync_status(&self) -> Result<SyncStatusSummary, AppError> {
        let tables = self.store.get_sync_metadata().await?.unwrap_or_default();
        let pending = self.store.get_pending_changes().await?.unwrap_or_default();
        Ok(SyncStatusSummary::from_parts(tables, pending.len()))
    }

    /// One full cycle: push local writes, then pull every table.
    pub async fn sync_once(&self) -> Result<SyncReport, AppError> {
        self.replay_pending_changes().await?;
        self.refresh_all().await
    }

    /// Runs [`Self::sync_once`] every `interval_secs` until the handle is aborted.
    pub fn schedule_sync(&self, interval_secs: u64) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                if let Err(e) = service.sync_once().await {
                    error!("Scheduled sync failed: {}", e);
                }
            }
        })
    }
}
