use anyhow::{Context, Result};
use clap::ValueEnum;
use regex::Regex;

/// Hebrew paseq mark, rendered as a vertical bar inside verse text.
const PASEQ: char = '\u{05C0}';

/// Whether the paseq mark survives cleaning. The two policies are
/// mutually exclusive; a run picks one for the whole database.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum PaseqPolicy {
    Keep,
    Strip,
}

impl PaseqPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Strip => "strip",
        }
    }
}

/// Normalizes a raw text field from the source dump: decode the HTML
/// entities the dump carries, apply the paseq policy, collapse
/// whitespace runs, trim.
pub fn clean_text(raw: &str, paseq: PaseqPolicy) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut text = raw.replace("&nbsp;", " ");
    text = text.replace("&amp;", "&");
    text = text.replace("&lt;", "<");
    text = text.replace("&gt;", ">");

    if matches!(paseq, PaseqPolicy::Strip) {
        text = text.replace(PASEQ, "");
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes nikkud and cantillation marks (U+0591 through U+05C7) for
/// the diacritic-insensitive search column.
pub struct MarkStripper {
    pattern: Regex,
}

impl MarkStripper {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"[\u{0591}-\u{05C7}]")
            .context("failed to compile Hebrew mark-range pattern")?;
        Ok(Self { pattern })
    }

    pub fn strip(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        self.pattern.replace_all(text, "").into_owned()
    }
}

/// Classifies a character within the Hebrew mark block for diagnostic
/// output. Characters outside the block return None.
pub fn mark_name(ch: char) -> Option<&'static str> {
    match ch {
        '\u{0591}'..='\u{05AF}' => Some("cantillation accent"),
        '\u{05B0}'..='\u{05BC}' => Some("vowel point"),
        '\u{05BD}' => Some("meteg"),
        '\u{05BE}' => Some("maqaf"),
        '\u{05BF}' => Some("rafe"),
        '\u{05C0}' => Some("paseq"),
        '\u{05C1}' | '\u{05C2}' => Some("shin/sin dot"),
        '\u{05C3}' => Some("sof pasuq"),
        '\u{05C4}' | '\u{05C5}' => Some("masora mark"),
        '\u{05C6}' => Some("nun hafukha"),
        '\u{05C7}' => Some("qamats qatan"),
        _ => None,
    }
}
