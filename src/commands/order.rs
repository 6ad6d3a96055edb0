use std::collections::HashSet;

use anyhow::{Result, bail};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::canon::{self, CanonEntry};
use crate::cli::OrderArgs;
use crate::db;
use crate::model::{MatchedLabel, OrderReconciliationReport, UnmappedLabel};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: OrderArgs) -> Result<()> {
    let entries = canon::load_canon(args.mapping_path.as_deref())?;
    let mut connection = db::open_existing(&args.db_path)?;

    info!(
        db = %args.db_path.display(),
        table = %args.table,
        entries = entries.len(),
        "starting canonical order backfill"
    );

    if !db::table_exists(&connection, &args.table)? {
        bail!(
            "table {} not found in {}; the ordering patch targets the legacy English-labelled layout",
            args.table,
            args.db_path.display()
        );
    }
    if !db::column_exists(&connection, &args.table, &args.label_column)? {
        bail!(
            "label column {} not found on table {}",
            args.label_column,
            args.table
        );
    }

    if db::ensure_column(&connection, &args.table, "tanakh_id INTEGER")? {
        info!(table = %args.table, "added tanakh_id column");
    }
    if db::ensure_column(&connection, &args.table, "book_hebrew TEXT")? {
        info!(table = %args.table, "added book_hebrew column");
    }

    let (matched, unused_entries) =
        apply_canon(&mut connection, &args.table, &args.label_column, &entries)?;
    let unmapped = unmapped_labels(&connection, &args.table, &args.label_column, &entries)?;

    for label in &unmapped {
        warn!(
            label = %label.label,
            rows = label.verse_rows,
            "label present in the database but absent from the mapping; rows left unmodified"
        );
    }
    for english in &unused_entries {
        info!(entry = %english, "mapping entry matched no rows");
    }

    let report_path = args.report_path.clone().unwrap_or_else(|| {
        args.manifest_dir.join(format!(
            "order_reconciliation_{}.json",
            utc_compact_string(Utc::now())
        ))
    });

    let report = OrderReconciliationReport {
        report_version: 1,
        generated_at: now_utc_string(),
        db_path: args.db_path.display().to_string(),
        table: args.table.clone(),
        label_column: args.label_column.clone(),
        mapping_entry_count: entries.len(),
        matched,
        unmapped_labels: unmapped,
        unused_entries,
    };
    write_json_pretty(&report_path, &report)?;

    info!(
        matched = report.matched.len(),
        unmapped = report.unmapped_labels.len(),
        unused = report.unused_entries.len(),
        report = %report_path.display(),
        "canonical order backfill completed"
    );

    Ok(())
}

fn apply_canon(
    connection: &mut Connection,
    table: &str,
    label_column: &str,
    entries: &[CanonEntry],
) -> Result<(Vec<MatchedLabel>, Vec<String>)> {
    let update_sql =
        format!("UPDATE {table} SET tanakh_id = ?1, book_hebrew = ?2 WHERE {label_column} = ?3");

    let mut matched = Vec::new();
    let mut unused = Vec::new();

    let tx = connection.transaction()?;
    {
        let mut statement = tx.prepare(&update_sql)?;
        for entry in entries {
            let rows = statement.execute(params![entry.order, entry.hebrew, entry.english])?;
            if rows == 0 {
                unused.push(entry.english.clone());
            } else {
                matched.push(MatchedLabel {
                    english: entry.english.clone(),
                    hebrew: entry.hebrew.clone(),
                    order: entry.order,
                    verse_rows: rows as i64,
                });
            }
        }
    }
    tx.commit()?;

    Ok((matched, unused))
}

fn unmapped_labels(
    connection: &Connection,
    table: &str,
    label_column: &str,
    entries: &[CanonEntry],
) -> Result<Vec<UnmappedLabel>> {
    let known: HashSet<&str> = entries.iter().map(|entry| entry.english.as_str()).collect();

    let sql = format!(
        "SELECT {label_column}, COUNT(*) FROM {table} GROUP BY {label_column} ORDER BY {label_column}"
    );
    let mut statement = connection.prepare(&sql)?;
    let mut rows = statement.query([])?;

    let mut unmapped = Vec::new();
    while let Some(row) = rows.next()? {
        let label: Option<String> = row.get(0)?;
        let verse_rows: i64 = row.get(1)?;
        let label = label.unwrap_or_default();
        if !known.contains(label.as_str()) {
            unmapped.push(UnmappedLabel { label, verse_rows });
        }
    }

    Ok(unmapped)
}
