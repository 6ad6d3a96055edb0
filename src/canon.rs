use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// One Tanakh book in canonical order: the English label used by the
/// legacy database, the cross-testament position, the Hebrew name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonEntry {
    pub english: String,
    pub order: i64,
    pub hebrew: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameEntry {
    pub from: String,
    pub to: String,
}

const TANAKH_CANON: &[(&str, i64, &str)] = &[
    // Torah
    ("Genesis", 1, "בראשית"),
    ("Exodus", 2, "שמות"),
    ("Leviticus", 3, "ויקרא"),
    ("Numbers", 4, "במדבר"),
    ("Deuteronomy", 5, "דברים"),
    // Nevi'im, former prophets
    ("Joshua", 6, "יהושע"),
    ("Judges", 7, "שופטים"),
    ("I Samuel", 8, "שמואל א"),
    ("II Samuel", 9, "שמואל ב"),
    ("I Kings", 10, "מלכים א"),
    ("II Kings", 11, "מלכים ב"),
    // Latter prophets
    ("Isaiah", 12, "ישעיהו"),
    ("Jeremiah", 13, "ירמיהו"),
    ("Ezekiel", 14, "יחזקאל"),
    // Trei Asar
    ("Hosea", 15, "הושע"),
    ("Joel", 16, "יואל"),
    ("Amos", 17, "עמוס"),
    ("Obadiah", 18, "עובדיה"),
    ("Jonah", 19, "יונה"),
    ("Micah", 20, "מיכה"),
    ("Nahum", 21, "נחום"),
    ("Habakkuk", 22, "חבקוק"),
    ("Zephaniah", 23, "צפניה"),
    ("Haggai", 24, "חגי"),
    ("Zechariah", 25, "זכריה"),
    ("Malachi", 26, "מלאכי"),
    // Ketuvim
    ("Psalms", 27, "תהילים"),
    ("Proverbs", 28, "משלי"),
    ("Job", 29, "איוב"),
    ("Song of Songs", 30, "שיר השירים"),
    ("Ruth", 31, "רות"),
    ("Lamentations", 32, "איכה"),
    ("Ecclesiastes", 33, "קהלת"),
    ("Esther", 34, "אסתר"),
    ("Daniel", 35, "דניאל"),
    ("Ezra", 36, "עזרא"),
    ("Nehemiah", 37, "נחמיה"),
    ("I Chronicles", 38, "דברי הימים א"),
    ("II Chronicles", 39, "דברי הימים ב"),
];

// Numbered epistles carry a leading digit in the source; the reader
// expects the digit rendered as a trailing Hebrew letter.
const NT_RENAMES: &[(&str, &str)] = &[
    ("1 קורינתיים", "קורינתיים א"),
    ("2 קורינתיים", "קורינתיים ב"),
    ("1 תסלוניקים", "תסלוניקים א"),
    ("2 תסלוניקים", "תסלוניקים ב"),
    ("1 טימותיאוס", "טימותיאוס א"),
    ("2 טימותיאוס", "טימותיאוס ב"),
    ("1 פטרוס", "פטרוס א"),
    ("2 פטרוס", "פטרוס ב"),
    ("1 יוחנן", "יוחנן א"),
    ("2 יוחנן", "יוחנן ב"),
    ("3 יוחנן", "יוחנן ג"),
];

pub fn default_canon() -> Vec<CanonEntry> {
    TANAKH_CANON
        .iter()
        .map(|(english, order, hebrew)| CanonEntry {
            english: (*english).to_string(),
            order: *order,
            hebrew: (*hebrew).to_string(),
        })
        .collect()
}

pub fn default_renames() -> Vec<RenameEntry> {
    NT_RENAMES
        .iter()
        .map(|(from, to)| RenameEntry {
            from: (*from).to_string(),
            to: (*to).to_string(),
        })
        .collect()
}

/// Loads the canonical mapping from a JSON file, or falls back to the
/// built-in table. The result is validated either way.
pub fn load_canon(path: Option<&Path>) -> Result<Vec<CanonEntry>> {
    let entries = match path {
        Some(path) => {
            let raw =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => default_canon(),
    };
    validate_canon(&entries)?;
    Ok(entries)
}

pub fn load_renames(path: Option<&Path>) -> Result<Vec<RenameEntry>> {
    let entries = match path {
        Some(path) => {
            let raw =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => default_renames(),
    };
    validate_renames(&entries)?;
    Ok(entries)
}

pub fn validate_canon(entries: &[CanonEntry]) -> Result<()> {
    if entries.is_empty() {
        bail!("canonical mapping is empty");
    }

    let mut seen_english = HashSet::new();
    let mut seen_orders = HashSet::new();
    for entry in entries {
        if entry.english.trim().is_empty() {
            bail!("canonical mapping has an entry with an empty English label");
        }
        if entry.hebrew.trim().is_empty() {
            bail!(
                "canonical mapping entry {} has an empty Hebrew name",
                entry.english
            );
        }
        if !seen_english.insert(entry.english.as_str()) {
            bail!(
                "duplicate English label in canonical mapping: {}",
                entry.english
            );
        }
        if !seen_orders.insert(entry.order) {
            bail!(
                "duplicate canonical order {} in mapping entry {}",
                entry.order,
                entry.english
            );
        }
    }

    Ok(())
}

pub fn validate_renames(entries: &[RenameEntry]) -> Result<()> {
    if entries.is_empty() {
        bail!("rename mapping is empty");
    }

    let mut seen_from = HashSet::new();
    for entry in entries {
        if entry.from.trim().is_empty() || entry.to.trim().is_empty() {
            bail!("rename mapping has an entry with an empty label");
        }
        if entry.from == entry.to {
            bail!("rename mapping maps {} to itself", entry.from);
        }
        if !seen_from.insert(entry.from.as_str()) {
            bail!("duplicate source label in rename mapping: {}", entry.from);
        }
    }

    // A rename target that is also a source would be applied twice on
    // a re-run instead of staying a no-op.
    for entry in entries {
        if entries.iter().any(|other| other.from == entry.to) {
            bail!(
                "rename target {} is also a rename source; re-running would chain renames",
                entry.to
            );
        }
    }

    Ok(())
}
