use anyhow::{Result, bail};
use rusqlite::params;
use tracing::{info, warn};

use crate::cli::DiagnoseArgs;
use crate::db;
use crate::text::mark_name;

/// Prints selected verses with a character-level breakdown of marks
/// and punctuation, for chasing glyphs that render as glitches.
pub fn run(args: DiagnoseArgs) -> Result<()> {
    let connection = db::open_existing(&args.db_path)?;

    if !db::table_exists(&connection, "פסוקים")? {
        bail!("verses table not found in {}", args.db_path.display());
    }

    let mut statement = connection.prepare(
        "SELECT פסוק, תוכן FROM פסוקים WHERE מזהה_ספר = ?1 AND פרק = ?2 AND פסוק = ?3",
    )?;

    let mut found = 0_usize;
    for verse_number in &args.verses {
        let mut rows = statement.query(params![args.book, args.chapter, verse_number])?;
        while let Some(row) = rows.next()? {
            found += 1;
            let verse: i64 = row.get(0)?;
            let content: Option<String> = row.get(1)?;
            let content = content.unwrap_or_default();

            info!(
                book = args.book,
                chapter = args.chapter,
                verse,
                content = %content,
                "verse"
            );

            for ch in content.chars() {
                if ch.is_alphanumeric() || ch == ' ' {
                    continue;
                }
                info!(
                    glyph = %ch,
                    codepoint = %format!("U+{:04X}", ch as u32),
                    kind = mark_name(ch).unwrap_or("other"),
                    "mark"
                );
            }
        }
    }

    if found == 0 {
        warn!(
            book = args.book,
            chapter = args.chapter,
            "no matching verses found; check the book and chapter numbers"
        );
    }

    Ok(())
}
