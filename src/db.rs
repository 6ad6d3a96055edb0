use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

/// Opens a database that a prior run must already have produced.
pub fn open_existing(path: &Path) -> Result<Connection> {
    if !path.exists() {
        bail!(
            "database not found at {}; run `tanakhdb ingest` first",
            path.display()
        );
    }

    let connection = Connection::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    configure_connection(&connection)?;
    Ok(connection)
}

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn table_exists(connection: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table_name],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to look up table {table_name}"))?;
    Ok(count > 0)
}

pub fn column_exists(connection: &Connection, table_name: &str, column_name: &str) -> Result<bool> {
    let pragma_sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to inspect schema for table {table_name}"))?;

    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let existing_name: String = row.get(1)?;
        if existing_name == column_name {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Adds the column when the schema does not have it yet. Returns true
/// when the column was added by this call.
pub fn ensure_column(
    connection: &Connection,
    table_name: &str,
    column_definition: &str,
) -> Result<bool> {
    let Some(column_name) = column_definition.split_whitespace().next() else {
        bail!("invalid column definition: {column_definition}");
    };

    if column_exists(connection, table_name, column_name)? {
        return Ok(false);
    }

    let alter_sql = format!("ALTER TABLE {table_name} ADD COLUMN {column_definition}");
    connection
        .execute(&alter_sql, [])
        .with_context(|| format!("failed to add column {column_name} on {table_name}"))?;

    Ok(true)
}

pub fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_connection() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory DB should open");
        connection
            .execute_batch("CREATE TABLE ספרים (מזהה INTEGER PRIMARY KEY, שם TEXT)")
            .expect("schema should apply");
        connection
    }

    #[test]
    fn table_exists_sees_only_created_tables() {
        let connection = seeded_connection();
        assert!(table_exists(&connection, "ספרים").expect("lookup should succeed"));
        assert!(!table_exists(&connection, "books").expect("lookup should succeed"));
    }

    #[test]
    fn column_exists_inspects_the_table_schema() {
        let connection = seeded_connection();
        assert!(column_exists(&connection, "ספרים", "שם").expect("lookup should succeed"));
        assert!(!column_exists(&connection, "ספרים", "name_clean").expect("lookup should succeed"));
    }

    #[test]
    fn ensure_column_adds_once_and_is_idempotent() {
        let connection = seeded_connection();

        let added = ensure_column(&connection, "ספרים", "name_clean TEXT")
            .expect("first call should add the column");
        assert!(added);

        let added_again = ensure_column(&connection, "ספרים", "name_clean TEXT")
            .expect("second call should be a no-op");
        assert!(!added_again);

        assert!(column_exists(&connection, "ספרים", "name_clean").expect("lookup should succeed"));
    }

    #[test]
    fn ensure_column_rejects_blank_definition() {
        let connection = seeded_connection();
        assert!(ensure_column(&connection, "ספרים", "  ").is_err());
    }
}
