use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;

use crate::canon::{self, RenameEntry};
use crate::cli::RenameArgs;
use crate::db;

/// Candidate label locations across the two schema generations. The
/// first entry is the primary books table the reader queries.
const RENAME_LOCATIONS: &[(&str, &str)] = &[
    ("ספרים", "שם"),
    ("books", "name"),
    ("פסוקים", "book_hebrew"),
    ("verses", "book_hebrew"),
];

pub fn run(args: RenameArgs) -> Result<()> {
    let renames = canon::load_renames(args.renames_path.as_deref())?;
    let mut connection = db::open_existing(&args.db_path)?;

    info!(
        db = %args.db_path.display(),
        pairs = renames.len(),
        "starting book label rename"
    );

    let summary = apply_renames(&mut connection, &renames)?;

    info!(
        renamed_books = summary.primary_updates,
        total_row_updates = summary.total_updates,
        "rename completed"
    );

    log_primary_sample(&connection)?;

    Ok(())
}

#[derive(Debug, Default)]
struct RenameSummary {
    primary_updates: usize,
    total_updates: usize,
}

fn apply_renames(connection: &mut Connection, renames: &[RenameEntry]) -> Result<RenameSummary> {
    let mut summary = RenameSummary::default();

    let tx = connection.transaction()?;
    for (index, (table, column)) in RENAME_LOCATIONS.iter().copied().enumerate() {
        if !db::table_exists(&tx, table)? || !db::column_exists(&tx, table, column)? {
            info!(table, column, "location absent, skipped");
            continue;
        }

        let sql = format!("UPDATE {table} SET {column} = ?1 WHERE {column} = ?2");
        let mut statement = tx.prepare(&sql)?;
        for entry in renames {
            let rows = statement.execute(params![entry.to, entry.from])?;
            if rows > 0 {
                info!(table, from = %entry.from, to = %entry.to, rows, "renamed");
            }
            summary.total_updates += rows;
            if index == 0 {
                summary.primary_updates += rows;
            }
        }
    }
    tx.commit()?;

    Ok(summary)
}

fn log_primary_sample(connection: &Connection) -> Result<()> {
    if !db::table_exists(connection, "ספרים")? {
        return Ok(());
    }

    let mut statement = connection.prepare("SELECT שם FROM ספרים WHERE שם LIKE '%קורינתיים%'")?;
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        info!(book = %name, "current label");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::default_renames;
    use crate::db::query_count;

    fn seeded_connection() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory DB should open");
        connection
            .execute_batch(
                "
                CREATE TABLE ספרים (מזהה INTEGER PRIMARY KEY, שם TEXT);
                INSERT INTO ספרים (מזהה, שם) VALUES
                  (46, '1 קורינתיים'),
                  (47, '2 קורינתיים'),
                  (62, '1 יוחנן'),
                  (40, 'מתי');
                CREATE TABLE פסוקים (
                  מזהה INTEGER PRIMARY KEY AUTOINCREMENT,
                  book_hebrew TEXT
                );
                INSERT INTO פסוקים (book_hebrew) VALUES
                  ('1 קורינתיים'),
                  ('1 קורינתיים'),
                  ('מתי');
                ",
            )
            .expect("seed rows should insert");
        connection
    }

    #[test]
    fn old_label_is_replaced_by_exactly_one_new_label() {
        let mut connection = seeded_connection();
        apply_renames(&mut connection, &default_renames()).expect("rename should run");

        let renamed = query_count(
            &connection,
            "SELECT COUNT(*) FROM ספרים WHERE שם = 'קורינתיים א'",
        )
        .expect("count should run");
        assert_eq!(renamed, 1);

        let stale = query_count(
            &connection,
            "SELECT COUNT(*) FROM ספרים WHERE שם = '1 קורינתיים'",
        )
        .expect("count should run");
        assert_eq!(stale, 0);
    }

    #[test]
    fn rename_covers_the_denormalized_verse_column() {
        let mut connection = seeded_connection();
        let summary =
            apply_renames(&mut connection, &default_renames()).expect("rename should run");

        assert_eq!(summary.primary_updates, 3);
        assert_eq!(summary.total_updates, 5);

        let verses = query_count(
            &connection,
            "SELECT COUNT(*) FROM פסוקים WHERE book_hebrew = 'קורינתיים א'",
        )
        .expect("count should run");
        assert_eq!(verses, 2);
    }

    #[test]
    fn unrenamed_labels_are_untouched() {
        let mut connection = seeded_connection();
        apply_renames(&mut connection, &default_renames()).expect("rename should run");

        let untouched = query_count(&connection, "SELECT COUNT(*) FROM ספרים WHERE שם = 'מתי'")
            .expect("count should run");
        assert_eq!(untouched, 1);
    }

    #[test]
    fn rerunning_is_a_no_op() {
        let mut connection = seeded_connection();
        apply_renames(&mut connection, &default_renames()).expect("first run should succeed");
        let second =
            apply_renames(&mut connection, &default_renames()).expect("second run should succeed");

        assert_eq!(second.primary_updates, 0);
        assert_eq!(second.total_updates, 0);
    }

    #[test]
    fn absent_locations_are_skipped_without_error() {
        let mut connection = Connection::open_in_memory().expect("in-memory DB should open");
        connection
            .execute_batch(
                "
                CREATE TABLE books (id INTEGER PRIMARY KEY, name TEXT);
                INSERT INTO books (id, name) VALUES (1, '2 פטרוס');
                ",
            )
            .expect("seed rows should insert");

        let summary =
            apply_renames(&mut connection, &default_renames()).expect("rename should run");
        assert_eq!(summary.primary_updates, 0);
        assert_eq!(summary.total_updates, 1);

        let renamed: String = connection
            .query_row("SELECT name FROM books WHERE id = 1", [], |row| row.get(0))
            .expect("row should exist");
        assert_eq!(renamed, "פטרוס ב");
    }
}
