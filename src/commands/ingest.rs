use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::db::{configure_connection, query_count};
use crate::model::{IngestCounts, IngestPaths, IngestRunManifest, SourceDump};
use crate::text::{PaseqPolicy, clean_text};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

const DB_SCHEMA_VERSION: &str = "1.1.0";

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    if !args.source_path.exists() {
        bail!("source file not found: {}", args.source_path.display());
    }

    info!(
        source = %args.source_path.display(),
        db = %args.db_path.display(),
        paseq = args.paseq.as_str(),
        run_id = %run_id,
        "starting ingest"
    );

    let raw = fs::read(&args.source_path)
        .with_context(|| format!("failed to read {}", args.source_path.display()))?;
    let dump: SourceDump = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", args.source_path.display()))?;
    let source_sha256 = sha256_file(&args.source_path)?;

    let staging_path = staging_path_for(&args.db_path);
    if staging_path.exists() {
        fs::remove_file(&staging_path).with_context(|| {
            format!(
                "failed to remove stale staging file {}; close any process holding it",
                staging_path.display()
            )
        })?;
    }

    let mut connection = Connection::open(&staging_path)
        .with_context(|| format!("failed to open {}", staging_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let stats = insert_source(&mut connection, &dump, args.paseq)?;
    record_metadata(&connection, &args, &source_sha256)?;

    let counts = IngestCounts {
        book_count: stats.book_count,
        chapter_count: stats.chapter_count,
        verse_count: stats.verse_count,
        titled_verse_count: stats.titled_verse_count,
        empty_verse_count: stats.empty_verse_count,
        books_total: query_count(&connection, "SELECT COUNT(*) FROM ספרים")?,
        verses_total: query_count(&connection, "SELECT COUNT(*) FROM פסוקים")?,
    };

    validate_staging(&dump, &counts).with_context(|| {
        format!(
            "staging database failed validation; {} left in place, {} untouched",
            staging_path.display(),
            args.db_path.display()
        )
    })?;

    drop(connection);

    fs::rename(&staging_path, &args.db_path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            staging_path.display(),
            args.db_path.display()
        )
    })?;

    let mut warnings = Vec::new();
    if counts.empty_verse_count > 0 {
        let message = format!("{} verses have empty text after cleaning", counts.empty_verse_count);
        warn!(count = counts.empty_verse_count, "empty verse text");
        warnings.push(message);
    }

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| {
            args.manifest_dir
                .join(format!("ingest_run_{}.json", utc_compact_string(started_ts)))
        });

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        source_sha256,
        paseq_policy: args.paseq.as_str().to_string(),
        paths: IngestPaths {
            source_path: args.source_path.display().to_string(),
            db_path: args.db_path.display().to_string(),
            staging_path: staging_path.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
        },
        counts,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        books = manifest.counts.book_count,
        chapters = manifest.counts.chapter_count,
        verses = manifest.counts.verse_count,
        db = %args.db_path.display(),
        manifest = %manifest_path.display(),
        "ingest completed"
    );

    Ok(())
}

fn staging_path_for(db_path: &Path) -> PathBuf {
    let mut file_name = db_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(".staging");
    db_path.with_file_name(file_name)
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ספרים (
          מזהה INTEGER PRIMARY KEY,
          שם TEXT,
          שם_קצר TEXT,
          תיאור TEXT
        );

        CREATE TABLE IF NOT EXISTS פסוקים (
          מזהה INTEGER PRIMARY KEY AUTOINCREMENT,
          מזהה_ספר INTEGER,
          פרק INTEGER,
          פסוק INTEGER,
          תוכן TEXT,
          כותרת TEXT,
          FOREIGN KEY(מזהה_ספר) REFERENCES ספרים(מזהה)
        );

        CREATE INDEX IF NOT EXISTS idx_verses_location ON פסוקים(מזהה_ספר, פרק, פסוק);
        ",
    )?;

    Ok(())
}

fn record_metadata(connection: &Connection, args: &IngestArgs, source_sha256: &str) -> Result<()> {
    let pairs = [
        ("db_schema_version", DB_SCHEMA_VERSION.to_string()),
        ("source_path", args.source_path.display().to_string()),
        ("source_sha256", source_sha256.to_string()),
        ("paseq_policy", args.paseq.as_str().to_string()),
        ("ingested_at", now_utc_string()),
    ];

    for (key, value) in pairs {
        connection.execute(
            "INSERT INTO metadata(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
    }

    Ok(())
}

#[derive(Debug, Default)]
struct InsertStats {
    book_count: usize,
    chapter_count: usize,
    verse_count: usize,
    titled_verse_count: usize,
    empty_verse_count: usize,
}

fn insert_source(
    connection: &mut Connection,
    dump: &SourceDump,
    paseq: PaseqPolicy,
) -> Result<InsertStats> {
    let mut stats = InsertStats::default();

    let tx = connection.transaction()?;
    {
        let mut book_stmt = tx.prepare(
            "INSERT INTO ספרים (מזהה, שם, שם_קצר, תיאור) VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut verse_stmt = tx.prepare(
            "INSERT INTO פסוקים (מזהה_ספר, פרק, פסוק, תוכן, כותרת) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for (book_id, book) in numeric_order(&dump.book)? {
            let name = clean_text(&book.info.name, paseq);
            let short_name = clean_text(&book.info.shortname, paseq);
            let desc = clean_text(&book.info.desc, paseq);

            book_stmt.execute(params![book_id, name, short_name, desc])?;
            stats.book_count += 1;

            info!(book = %name, id = book_id, "processing book");

            for (chapter_number, chapter) in numeric_order(&book.chapter)? {
                stats.chapter_count += 1;

                for (verse_number, verse) in numeric_order(&chapter.verse)? {
                    let content = clean_text(&verse.text, paseq);
                    let title = clean_text(&verse.title, paseq);

                    if content.is_empty() {
                        stats.empty_verse_count += 1;
                    }
                    if !title.is_empty() {
                        stats.titled_verse_count += 1;
                    }

                    verse_stmt.execute(params![
                        book_id,
                        chapter_number,
                        verse_number,
                        content,
                        title
                    ])?;
                    stats.verse_count += 1;
                }
            }
        }
    }
    tx.commit()?;

    Ok(stats)
}

/// Source keys are numeric strings; "10" sorts after "2".
fn numeric_order<T>(entries: &HashMap<String, T>) -> Result<Vec<(i64, &T)>> {
    let mut keyed = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let number = key
            .parse::<i64>()
            .with_context(|| format!("non-numeric key in source dump: {key}"))?;
        keyed.push((number, value));
    }
    keyed.sort_by_key(|(number, _)| *number);
    Ok(keyed)
}

fn source_totals(dump: &SourceDump) -> (usize, usize) {
    let book_count = dump.book.len();
    let verse_count = dump
        .book
        .values()
        .map(|book| {
            book.chapter
                .values()
                .map(|chapter| chapter.verse.len())
                .sum::<usize>()
        })
        .sum();
    (book_count, verse_count)
}

fn validate_staging(dump: &SourceDump, counts: &IngestCounts) -> Result<()> {
    let (expected_books, expected_verses) = source_totals(dump);

    if counts.books_total != expected_books as i64 {
        bail!(
            "book row count {} does not match source book count {}",
            counts.books_total,
            expected_books
        );
    }
    if counts.verses_total != expected_verses as i64 {
        bail!(
            "verse row count {} does not match source verse count {}",
            counts.verses_total,
            expected_verses
        );
    }

    Ok(())
}
