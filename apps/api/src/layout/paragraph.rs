//! Paragraph splitting and syntactic heading detection.
//!
//! A paragraph is any run of text without an internal blank line. Headings
//! are detected purely from length, punctuation and case; the predicate is
//! intentionally crude and must not change, since stored documents were laid
//! out with it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Paragraphs at or above this many characters are never headings.
const MAX_HEADING_CHARS: usize = 80;

const FALLBACK_TITLE: &str = "Document";

static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// One trimmed, non-empty paragraph of the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    pub is_heading: bool,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let is_heading = is_heading(&text);
        Paragraph { text, is_heading }
    }

    /// Whitespace-separated words, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace()
    }
}

/// Splits `text` on blank lines, trims each piece and drops empty ones.
pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    BLANK_LINE_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(Paragraph::new)
        .collect()
}

/// Heading when shorter than 80 chars and it ends with ':', has no '.', or is all caps.
pub fn is_heading(text: &str) -> bool {
    text.chars().count() < MAX_HEADING_CHARS
        && (text.ends_with(':') || !text.contains('.') || text.to_uppercase() == text)
}

/// Derives a document title from an uploaded filename by dropping any
/// directory part and the final extension.
pub fn title_from_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let stem = match base.rfind('.') {
        Some(0) | None => base,
        Some(dot) => &base[..dot],
    };

    if stem.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        stem.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
