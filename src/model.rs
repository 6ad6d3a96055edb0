use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top level of the source dump: a `book` mapping keyed by numeric
/// strings. Chapter and verse keys are numeric strings as well; the
/// ingest sorts them by numeric value, not lexical order.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDump {
    #[serde(default)]
    pub book: HashMap<String, SourceBook>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceBook {
    #[serde(default)]
    pub info: SourceBookInfo,
    #[serde(default)]
    pub chapter: HashMap<String, SourceChapter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceBookInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shortname: String,
    #[serde(default)]
    pub desc: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceChapter {
    #[serde(default)]
    pub verse: HashMap<String, SourceVerse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceVerse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestPaths {
    pub source_path: String,
    pub db_path: String,
    pub staging_path: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestCounts {
    pub book_count: usize,
    pub chapter_count: usize,
    pub verse_count: usize,
    pub titled_verse_count: usize,
    pub empty_verse_count: usize,
    pub books_total: i64,
    pub verses_total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub source_sha256: String,
    pub paseq_policy: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedLabel {
    pub english: String,
    pub hebrew: String,
    pub order: i64,
    pub verse_rows: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmappedLabel {
    pub label: String,
    pub verse_rows: i64,
}

/// Reconciliation between the canonical mapping and the labels that
/// actually occur in the database. Labels on either side without a
/// counterpart are reported instead of silently skipped.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReconciliationReport {
    pub report_version: u32,
    pub generated_at: String,
    pub db_path: String,
    pub table: String,
    pub label_column: String,
    pub mapping_entry_count: usize,
    pub matched: Vec<MatchedLabel>,
    pub unmapped_labels: Vec<UnmappedLabel>,
    pub unused_entries: Vec<String>,
}
