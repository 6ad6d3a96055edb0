use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::db::{column_exists, query_count, table_exists};

pub fn run(args: StatusArgs) -> Result<()> {
    info!(db = %args.db_path.display(), "status requested");

    if !args.db_path.exists() {
        warn!(path = %args.db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = Connection::open(&args.db_path)
        .with_context(|| format!("failed to open {}", args.db_path.display()))?;

    if table_exists(&connection, "ספרים")? {
        let books = query_count(&connection, "SELECT COUNT(*) FROM ספרים")?;
        info!(books, "books table");
    } else {
        warn!("books table missing");
    }

    if table_exists(&connection, "פסוקים")? {
        let verses = query_count(&connection, "SELECT COUNT(*) FROM פסוקים")?;
        info!(verses, "verses table");

        if column_exists(&connection, "פסוקים", "clean_text")? {
            let populated = query_count(
                &connection,
                "SELECT COUNT(*) FROM פסוקים WHERE clean_text IS NOT NULL",
            )?;
            info!(populated, total = verses, "clean_text coverage");
        } else {
            info!("clean_text column not added yet");
        }
    } else {
        warn!("verses table missing");
    }

    if table_exists(&connection, "verses")? && column_exists(&connection, "verses", "tanakh_id")? {
        let ordered = query_count(
            &connection,
            "SELECT COUNT(*) FROM verses WHERE tanakh_id IS NOT NULL",
        )?;
        let total = query_count(&connection, "SELECT COUNT(*) FROM verses")?;
        info!(ordered, total, "canonical order coverage on legacy table");
    }

    if table_exists(&connection, "metadata")? {
        let mut statement = connection.prepare("SELECT key, value FROM metadata ORDER BY key")?;
        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            info!(key = %key, value = %value, "metadata");
        }
    }

    Ok(())
}
