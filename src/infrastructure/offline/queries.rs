pub(super) const SEED_SYNC_METADATA: &str = r#"
    INSERT OR IGNORE INTO sync_metadata (table_name, last_sync, status, record_count)
    VALUES (?1, 0, 'pending', 0)
"#;

pub(super) const SELECT_SYNC_METADATA: &str = r#"
    SELECT table_name, last_sync, status, record_count, error_message, updated_at
    FROM sync_metadata
    ORDER BY table_name ASC
"#;

pub(super) const UPDATE_SYNC_METADATA: &str = r#"
    UPDATE sync_metadata
    SET last_sync = COALESCE(?1, last_sync),
        status = COALESCE(?2, status),
        record_count = COALESCE(?3, record_count),
        error_message = CASE WHEN ?4 = 1 THEN ?5 ELSE error_message END,
        updated_at = ?6
    WHERE table_name = ?7
"#;

pub(super) const INSERT_PENDING_CHANGE: &str = r#"
    INSERT INTO pending_changes (
        id,
        table_name,
        record_id,
        operation,
        data,
        created_at,
        synced
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
"#;

pub(super) const SELECT_UNSYNCED_CHANGES: &str = r#"
    SELECT id, table_name, record_id, operation, data, created_at, synced
    FROM pending_changes
    WHERE synced = 0
    ORDER BY created_at ASC, rowid ASC
"#;

pub(super) const MARK_CHANGE_SYNCED: &str = r#"
    UPDATE pending_changes
    SET synced = 1
    WHERE id = ?1 AND synced = 0
"#;

pub(super) const DELETE_SYNCED_CHANGES: &str = r#"
    DELETE FROM pending_changes
    WHERE synced = 1
"#;
