use super::backend::{ensure_primary_keys, StorageBackend, BULK_INSERT_BATCH_SIZE};
use super::queries::{
    DELETE_SYNCED_CHANGES, INSERT_PENDING_CHANGE, MARK_CHANGE_SYNCED, SEED_SYNC_METADATA,
    SELECT_SYNC_METADATA, SELECT_UNSYNCED_CHANGES, UPDATE_SYNC_METADATA,
};
use super::rows::{PendingChangeRow, SyncMetadataRow};
use super::schema::{schema_statements, upsert_statement};
use crate::application::ports::BackendKind;
use crate::domain::entities::record::record_id;
use crate::domain::entities::{PendingChange, Record, RecordFilter, SyncMetadataRecord, SyncMetadataUpdate};
use crate::domain::value_objects::{MirroredTable, PendingChangeId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Relational backing over a SQLite pool.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Opens (creating if needed) the database at `database_url` and brings the
    /// schema up to date.
    pub async fn open(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let in_memory = database_url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        if !in_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        // Each connection to an in-memory database is its own database.
        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(acquire_timeout);
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        info!("Offline database connected: {}", database_url);

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, creating schema and seeding the sync ledger.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, AppError> {
        let mut conn = pool.acquire().await?;
        create_schema(&mut conn).await?;
        seed_sync_metadata(&mut conn).await?;
        drop(conn);
        Ok(Self { pool })
    }
}

async fn create_schema(conn: &mut SqliteConnection) -> Result<(), AppError> {
    for statement in schema_statements() {
        sqlx::query(&statement).execute(&mut *conn).await?;
    }
    debug!("Offline schema ensured");
    Ok(())
}

async fn seed_sync_metadata(conn: &mut SqliteConnection) -> Result<(), AppError> {
    for table in MirroredTable::ALL {
        sqlx::query(SEED_SYNC_METADATA)
            .bind(table.as_str())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<&Value> for SqlValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Real(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            // Nested values are kept as their JSON text.
            other => SqlValue::Text(other.to_string()),
        }
    }
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: SqlValue) -> SqliteQuery<'q> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
    }
}

fn row_to_record(row: &SqliteRow) -> Result<Record, AppError> {
    let mut record = Record::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(index)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => Value::String(BASE64.encode(row.try_get::<Vec<u8>, _>(index)?)),
                _ => Value::String(row.try_get::<String, _>(index)?),
            }
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn select_statement(table: MirroredTable, filter: &RecordFilter) -> String {
    let mut sql = format!("SELECT * FROM {}", table.as_str());
    let mut placeholder = 0;
    let clauses = filter
        .conditions()
        .iter()
        .map(|(column, value)| {
            if value.is_null() {
                format!("{column} IS NULL")
            } else {
                placeholder += 1;
                format!("{column} = ?{placeholder}")
            }
        })
        .collect::<Vec<_>>();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn repair(&self) -> Result<(), AppError> {
        // PRAGMA foreign_keys is per connection, so everything runs on one.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("PRAGMA foreign_keys = OFF")
            .execute(&mut *conn)
            .await?;

        let result = match create_schema(&mut conn).await {
            Ok(()) => seed_sync_metadata(&mut conn).await,
            Err(err) => Err(err),
        };

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&mut *conn)
            .await?;

        result?;
        info!("Offline database repaired");
        Ok(())
    }

    async fn sync_metadata(&self) -> Result<Vec<SyncMetadataRecord>, AppError> {
        let rows = sqlx::query_as::<_, SyncMetadataRow>(SELECT_SYNC_METADATA)
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let table_name = row.table_name.clone();
            match SyncMetadataRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(err) => warn!(table = %table_name, error = %err, "Skipping unreadable sync metadata row"),
            }
        }
        Ok(records)
    }

    async fn update_sync_metadata(
        &self,
        table: MirroredTable,
        update: &SyncMetadataUpdate,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let record_count = update
            .record_count
            .map(|count| {
                i64::try_from(count)
                    .map_err(|_| AppError::InvalidInput(format!("record_count out of range: {count}")))
            })
            .transpose()?;
        let error_message = update.error_message.clone().flatten();

        let result = sqlx::query(UPDATE_SYNC_METADATA)
            .bind(update.last_sync.map(|at| at.timestamp_millis()))
            .bind(update.status.map(|status| status.as_str()))
            .bind(record_count)
            .bind(update.error_message.is_some())
            .bind(error_message)
            .bind(now.timestamp_millis())
            .bind(table.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn append_change(&self, change: &PendingChange) -> Result<(), AppError> {
        let data = serde_json::to_string(&change.data)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;

        sqlx::query(INSERT_PENDING_CHANGE)
            .bind(change.id.as_str())
            .bind(change.table_name.as_str())
            .bind(&change.record_id)
            .bind(change.operation.as_str())
            .bind(data)
            .bind(change.created_at.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unsynced_changes(&self) -> Result<Vec<PendingChange>, AppError> {
        let rows = sqlx::query_as::<_, PendingChangeRow>(SELECT_UNSYNCED_CHANGES)
            .fetch_all(&self.pool)
            .await?;

        let mut changes = Vec::with_capacity(rows.len());
        for row in rows {
            let change_id = row.id.clone();
            match PendingChange::try_from(row) {
                Ok(change) => changes.push(change),
                Err(err) => warn!(id = %change_id, error = %err, "Skipping unreadable pending change row"),
            }
        }
        Ok(changes)
    }

    async fn mark_synced(&self, change_id: &PendingChangeId) -> Result<u64, AppError> {
        let result = sqlx::query(MARK_CHANGE_SYNCED)
            .bind(change_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_synced(&self) -> Result<u64, AppError> {
        let result = sqlx::query(DELETE_SYNCED_CHANGES)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn replace_all(&self, table: MirroredTable, records: &[Record]) -> Result<u64, AppError> {
        ensure_primary_keys(table, records)?;

        let upsert = upsert_statement(table);
        let delete = format!("DELETE FROM {}", table.as_str());
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(&delete).execute(&mut *tx).await?.rows_affected();

        let mut inserted = 0u64;
        for (batch_index, batch) in records.chunks(BULK_INSERT_BATCH_SIZE).enumerate() {
            for record in batch {
                let mut query = sqlx::query(&upsert);
                for column in table.columns() {
                    let value = if column.name == MirroredTable::PRIMARY_KEY {
                        record_id(record).map(SqlValue::Text).unwrap_or(SqlValue::Null)
                    } else {
                        SqlValue::from(record.get(column.name).unwrap_or(&Value::Null))
                    };
                    query = bind_value(query, value);
                }
                inserted += query.execute(&mut *tx).await?.rows_affected();
            }
            debug!(
                table = %table,
                batch = batch_index + 1,
                size = batch.len(),
                "Mirrored batch written"
            );
        }

        tx.commit().await?;
        debug!(table = %table, removed, inserted, "Mirrored table replaced");
        Ok(inserted)
    }

    async fn clear(&self, table: MirroredTable) -> Result<u64, AppError> {
        let delete = format!("DELETE FROM {}", table.as_str());
        let result = sqlx::query(&delete).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn records(
        &self,
        table: MirroredTable,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, AppError> {
        if let Some((column, _)) = filter
            .conditions()
            .iter()
            .find(|(column, _)| !table.has_column(column))
        {
            debug!(table = %table, column = %column, "Condition on unknown column matches nothing");
            return Ok(Vec::new());
        }

        let sql = select_statement(table, filter);
        let mut query = sqlx::query(&sql);
        for (_, value) in filter.conditions() {
            if !value.is_null() {
                query = bind_value(query, SqlValue::from(value));
            }
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn execute(&self, query: &str, values: &[Value]) -> Result<u64, AppError> {
        let mut statement = sqlx::query(query);
        for value in values {
            statement = bind_value(statement, SqlValue::from(value));
        }
        let result = statement.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Offline database closed");
    }
}
