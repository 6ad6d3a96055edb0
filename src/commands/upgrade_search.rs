use anyhow::{Result, bail};
use rusqlite::{Connection, params};
use tracing::info;

use crate::cli::UpgradeSearchArgs;
use crate::db;
use crate::text::MarkStripper;

pub fn run(args: UpgradeSearchArgs) -> Result<()> {
    let stripper = MarkStripper::new()?;
    let mut connection = db::open_existing(&args.db_path)?;

    if !db::table_exists(&connection, "פסוקים")? {
        bail!("verses table not found in {}", args.db_path.display());
    }

    if db::ensure_column(&connection, "פסוקים", "clean_text TEXT")? {
        info!("added clean_text column");
    } else {
        info!("clean_text column already present, refreshing data");
    }

    let books_present = db::table_exists(&connection, "ספרים")?;
    if books_present && db::ensure_column(&connection, "ספרים", "name_clean TEXT")? {
        info!("added name_clean column");
    }

    let verse_updates = refresh_clean_text(&mut connection, &stripper)?;
    info!(verses = verse_updates, "search column populated");

    if books_present {
        let book_updates = refresh_name_clean(&mut connection, &stripper)?;
        info!(books = book_updates, "book names populated");
    }

    log_sample(&connection)?;

    Ok(())
}

fn refresh_clean_text(connection: &mut Connection, stripper: &MarkStripper) -> Result<usize> {
    let mut updates = Vec::new();
    {
        let mut statement = connection.prepare("SELECT מזהה, תוכן FROM פסוקים")?;
        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            let verse_id: i64 = row.get(0)?;
            let content: Option<String> = row.get(1)?;
            updates.push((stripper.strip(content.as_deref().unwrap_or_default()), verse_id));
        }
    }

    let tx = connection.transaction()?;
    {
        let mut statement = tx.prepare("UPDATE פסוקים SET clean_text = ?1 WHERE מזהה = ?2")?;
        for (clean, verse_id) in &updates {
            statement.execute(params![clean, verse_id])?;
        }
    }
    tx.commit()?;

    Ok(updates.len())
}

fn refresh_name_clean(connection: &mut Connection, stripper: &MarkStripper) -> Result<usize> {
    let mut updates = Vec::new();
    {
        let mut statement = connection.prepare("SELECT מזהה, שם FROM ספרים")?;
        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            let book_id: i64 = row.get(0)?;
            let name: Option<String> = row.get(1)?;
            updates.push((stripper.strip(name.as_deref().unwrap_or_default()), book_id));
        }
    }

    let tx = connection.transaction()?;
    {
        let mut statement = tx.prepare("UPDATE ספרים SET name_clean = ?1 WHERE מזהה = ?2")?;
        for (clean, book_id) in &updates {
            statement.execute(params![clean, book_id])?;
        }
    }
    tx.commit()?;

    Ok(updates.len())
}

fn log_sample(connection: &Connection) -> Result<()> {
    let mut statement =
        connection.prepare("SELECT תוכן, clean_text FROM פסוקים ORDER BY מזהה LIMIT 1")?;
    let mut rows = statement.query([])?;

    if let Some(row) = rows.next()? {
        let original: Option<String> = row.get(0)?;
        let clean: Option<String> = row.get(1)?;
        info!(
            original = %original.unwrap_or_default(),
            clean = %clean.unwrap_or_default(),
            "first verse sample"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{column_exists, ensure_column, query_count};

    fn seeded_connection() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory DB should open");
        connection
            .execute_batch(
                "
                CREATE TABLE ספרים (מזהה INTEGER PRIMARY KEY, שם TEXT);
                INSERT INTO ספרים (מזהה, שם) VALUES (1, 'בְּרֵאשִׁית');
                CREATE TABLE פסוקים (
                  מזהה INTEGER PRIMARY KEY AUTOINCREMENT,
                  מזהה_ספר INTEGER,
                  תוכן TEXT
                );
                INSERT INTO פסוקים (מזהה_ספר, תוכן) VALUES
                  (1, 'בְּרֵאשִׁ֖ית בָּרָ֣א'),
                  (1, 'וְהָאָ֗רֶץ'),
                  (1, NULL);
                ",
            )
            .expect("seed rows should insert");
        ensure_column(&connection, "פסוקים", "clean_text TEXT").expect("column should add");
        ensure_column(&connection, "ספרים", "name_clean TEXT").expect("column should add");
        connection
    }

    #[test]
    fn every_verse_row_receives_stripped_text() {
        let mut connection = seeded_connection();
        let stripper = MarkStripper::new().expect("stripper should build");

        let updated =
            refresh_clean_text(&mut connection, &stripper).expect("refresh should run");
        assert_eq!(updated, 3);

        let first: String = connection
            .query_row("SELECT clean_text FROM פסוקים WHERE מזהה = 1", [], |row| {
                row.get(0)
            })
            .expect("row should exist");
        assert_eq!(first, "בראשית ברא");

        let unset = query_count(
            &connection,
            "SELECT COUNT(*) FROM פסוקים WHERE clean_text IS NULL",
        )
        .expect("count should run");
        assert_eq!(unset, 0);
    }

    #[test]
    fn null_content_becomes_empty_clean_text() {
        let mut connection = seeded_connection();
        let stripper = MarkStripper::new().expect("stripper should build");
        refresh_clean_text(&mut connection, &stripper).expect("refresh should run");

        let clean: String = connection
            .query_row("SELECT clean_text FROM פסוקים WHERE מזהה = 3", [], |row| {
                row.get(0)
            })
            .expect("row should exist");
        assert_eq!(clean, "");
    }

    #[test]
    fn refreshing_twice_gives_the_same_result() {
        let mut connection = seeded_connection();
        let stripper = MarkStripper::new().expect("stripper should build");

        refresh_clean_text(&mut connection, &stripper).expect("first refresh should run");
        let first: String = connection
            .query_row("SELECT clean_text FROM פסוקים WHERE מזהה = 2", [], |row| {
                row.get(0)
            })
            .expect("row should exist");

        refresh_clean_text(&mut connection, &stripper).expect("second refresh should run");
        let second: String = connection
            .query_row("SELECT clean_text FROM פסוקים WHERE מזהה = 2", [], |row| {
                row.get(0)
            })
            .expect("row should exist");

        assert_eq!(first, second);
    }

    #[test]
    fn book_names_are_stripped_into_name_clean() {
        let mut connection = seeded_connection();
        let stripper = MarkStripper::new().expect("stripper should build");

        let updated =
            refresh_name_clean(&mut connection, &stripper).expect("refresh should run");
        assert_eq!(updated, 1);
        assert!(column_exists(&connection, "ספרים", "name_clean").expect("lookup should succeed"));

        let clean: String = connection
            .query_row("SELECT name_clean FROM ספרים WHERE מזהה = 1", [], |row| {
                row.get(0)
            })
            .expect("row should exist");
        assert_eq!(clean, "בראשית");
    }
}
