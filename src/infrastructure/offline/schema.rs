use crate::domain::value_objects::MirroredTable;

pub(super) const CREATE_SYNC_METADATA: &str = r#"
    CREATE TABLE IF NOT EXISTS sync_metadata (
        table_name TEXT PRIMARY KEY NOT NULL,
        last_sync INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('synced', 'pending', 'conflict', 'error')),
        record_count INTEGER NOT NULL DEFAULT 0 CHECK (record_count >= 0),
        error_message TEXT,
        updated_at INTEGER
    )
"#;

pub(super) const CREATE_PENDING_CHANGES: &str = r#"
    CREATE TABLE IF NOT EXISTS pending_changes (
        id TEXT PRIMARY KEY NOT NULL,
        table_name TEXT NOT NULL,
        record_id TEXT NOT NULL,
        operation TEXT NOT NULL CHECK (operation IN ('insert', 'update', 'delete')),
        data TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        synced INTEGER NOT NULL DEFAULT 0
    )
"#;

pub(super) const CREATE_PENDING_CHANGES_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_pending_changes_unsynced
    ON pending_changes (synced, created_at)
"#;

pub(super) const CREATE_PRINTER_ASSIGNMENTS_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_printer_assignments_printer
    ON printer_assignments (printer_id, is_active)
"#;

/// `CREATE TABLE IF NOT EXISTS` for one mirrored table. No foreign keys: the
/// relation columns are informational.
pub(super) fn mirrored_table_ddl(table: MirroredTable) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            if column.name == MirroredTable::PRIMARY_KEY {
                format!("{} TEXT PRIMARY KEY NOT NULL", column.name)
            } else {
                format!("{} {}", column.name, column.column_type.as_sql())
            }
        })
        .collect::<Vec<_>>()
        .join(",\n        ");

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n        {}\n    )",
        table.as_str(),
        columns
    )
}

/// Every statement needed for a complete local schema, in execution order.
pub(super) fn schema_statements() -> Vec<String> {
    let mut statements: Vec<String> = MirroredTable::ALL
        .iter()
        .map(|table| mirrored_table_ddl(*table))
        .collect();
    statements.push(CREATE_PRINTER_ASSIGNMENTS_INDEX.to_string());
    statements.push(CREATE_SYNC_METADATA.to_string());
    statements.push(CREATE_PENDING_CHANGES.to_string());
    statements.push(CREATE_PENDING_CHANGES_INDEX.to_string());
    statements
}

/// `INSERT OR REPLACE` over every known column of `table`, in column order.
pub(super) fn upsert_statement(table: MirroredTable) -> String {
    let columns = table.columns();
    let names = columns
        .iter()
        .map(|column| column.name)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
        table.as_str(),
        names,
        placeholders
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printers_ddl_declares_text_primary_key() {
        let ddl = mirrored_table_ddl(MirroredTable::Printers);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS printers"));
        assert!(ddl.contains("id TEXT PRIMARY KEY NOT NULL"));
        assert!(ddl.contains("is_available INTEGER"));
        assert!(!ddl.contains("REFERENCES"));
    }

    #[test]
    fn upsert_binds_every_column() {
        let sql = upsert_statement(MirroredTable::Suppliers);
        let count = MirroredTable::Suppliers.columns().len();
        assert!(sql.starts_with("INSERT OR REPLACE INTO suppliers (id, name"));
        assert!(sql.contains(&format!("?{count})")));
    }

    #[test]
    fn schema_covers_every_table_and_bookkeeping() {
        let statements = schema_statements();
        for table in MirroredTable::ALL {
            let prefix = format!("CREATE TABLE IF NOT EXISTS {} (", table.as_str());
            assert!(statements.iter().any(|s| s.starts_with(&prefix)));
        }
        assert!(statements.iter().any(|s| s.contains("sync_metadata")));
        assert!(statements.iter().any(|s| s.contains("pending_changes")));
    }
}
