//! Paginated text layout — turns raw text into positioned text runs on fixed-size pages.
//!
//! # Passes
//! 1. Split the text into paragraphs and classify headings (`paragraph.rs`).
//! 2. Greedy word-wrap each paragraph and stream the lines onto pages top to
//!    bottom, opening a new page whenever the cursor has dropped below the
//!    bottom margin. A paragraph may straddle a page boundary.
//! 3. Stamp "Page i of N" footers once the page count is final.
//!
//! Coordinates use the PDF convention: origin at the bottom-left corner, `y`
//! grows upwards, and each run's `(x, y)` is its baseline start.
//!
//! The engine is a pure function of its inputs. All mutable state lives in a
//! `LayoutCursor` owned by a single `layout` call, so concurrent requests
//! never share anything.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::font_metrics::{measure, FontFace};
use crate::layout::geometry::{LayoutError, PageGeometry};
use crate::layout::paragraph::{split_paragraphs, title_from_filename, Paragraph};

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// What a run represents on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunKind {
    Title,
    Heading,
    Body,
    Footer,
}

/// Fill colour of a run, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const FOOTER_GRAY: Rgb = Rgb {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };
}

/// A single left-aligned string drawn at a baseline position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub kind: RunKind,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
}

/// One physical page: its zero-based position and its runs in drawing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub runs: Vec<TextRun>,
}

impl Page {
    fn new(index: usize) -> Self {
        Page {
            index,
            runs: Vec::new(),
        }
    }

    /// Heading and body runs, i.e. everything except title and footer.
    pub fn content_lines(&self) -> impl Iterator<Item = &TextRun> {
        self.runs
            .iter()
            .filter(|r| matches!(r.kind, RunKind::Heading | RunKind::Body))
    }
}

/// Result of one layout pass. Owned exclusively by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaidOutDocument {
    pub title: String,
    pub pages: Vec<Page>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Transient write position: which page is open and the next baseline on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page: usize,
    pub y: f32,
}

impl LayoutCursor {
    /// Places one line, first breaking to a fresh page if the cursor has run
    /// under the bottom margin.
    fn place_line(
        &mut self,
        pages: &mut Vec<Page>,
        geometry: &PageGeometry,
        kind: RunKind,
        face: FontFace,
        size: f32,
        text: String,
    ) {
        if self.y < geometry.margin {
            pages.push(Page::new(pages.len()));
            self.page = pages.len() - 1;
            self.y = geometry.page_height - geometry.margin - geometry.font_size;
        }

        pages[self.page].runs.push(TextRun {
            kind,
            text,
            x: geometry.margin,
            y: self.y,
            face,
            size,
            color: Rgb::BLACK,
        });
        self.y -= geometry.line_height();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays `text` out onto pages titled after `filename_for_title`.
///
/// Fails only when `geometry` is unusable; any text, including an empty
/// string, is valid input. Empty input yields a single title page.
pub fn layout(
    text: &str,
    filename_for_title: &str,
    geometry: &PageGeometry,
) -> Result<LaidOutDocument, LayoutError> {
    geometry.validate()?;

    let title = title_from_filename(filename_for_title);
    let paragraphs = split_paragraphs(text);

    let mut pages = vec![Page::new(0)];
    let mut cursor = LayoutCursor {
        page: 0,
        y: geometry.page_height - geometry.margin - geometry.title_font_size,
    };

    pages[0].runs.push(TextRun {
        kind: RunKind::Title,
        text: title.clone(),
        x: geometry.margin,
        y: cursor.y,
        face: FontFace::Bold,
        size: geometry.title_font_size,
        color: Rgb::BLACK,
    });
    cursor.y -= geometry.title_font_size * geometry.line_height_factor;

    for paragraph in &paragraphs {
        let (kind, face, size) = paragraph_style(paragraph, geometry);
        for line in wrap_words(paragraph.words(), face, size, geometry.usable_width()) {
            cursor.place_line(&mut pages, geometry, kind, face, size, line);
        }
        cursor.y -= geometry.font_size;
    }

    stamp_footers(&mut pages, geometry);

    debug!(
        title = %title,
        paragraphs = paragraphs.len(),
        lines = pages.iter().map(|p| p.content_lines().count()).sum::<usize>(),
        pages = pages.len(),
        "Text layout complete"
    );

    Ok(LaidOutDocument { title, pages })
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn paragraph_style(paragraph: &Paragraph, geometry: &PageGeometry) -> (RunKind, FontFace, f32) {
    if paragraph.is_heading {
        (RunKind::Heading, FontFace::Bold, geometry.heading_font_size)
    } else {
        (RunKind::Body, FontFace::Regular, geometry.font_size)
    }
}

/// Greedy word-wrap. A word wider than `max_width` gets a line of its own and
/// is never split.
pub fn wrap_words<'a>(
    words: impl IntoIterator<Item = &'a str>,
    face: FontFace,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in words {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure(face, &candidate, size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Pass 3: adds "Page i of N" to every page once N is known.
fn stamp_footers(pages: &mut [Page], geometry: &PageGeometry) {
    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        page.runs.push(TextRun {
            kind: RunKind::Footer,
            text: format!("Page {} of {}", i + 1, total),
            x: geometry.margin,
            y: geometry.margin / 2.0,
            face: FontFace::Regular,
            size: geometry.footer_font_size,
            color: Rgb::FOOTER_GRAY,
        });
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> PageGeometry {
        PageGeometry::default()
    }

    fn footer(page: &Page) -> Option<&TextRun> {
        page.runs.iter().find(|r| r.kind == RunKind::Footer)
    }

    fn width(run: &TextRun) -> f32 {
        measure(run.face, &run.text, run.size)
    }

    fn all_content_words(doc: &LaidOutDocument) -> Vec<String> {
        doc.pages
            .iter()
            .flat_map(|p| p.content_lines())
            .flat_map(|r| r.text.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    fn long_body(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    // ── empty input ─────────────────────────────────────────────────────────

    #[test]
    fn test_empty_input_yields_title_page_only() {
        let doc = layout("", "report.txt", &geometry()).unwrap();
        assert_eq!(doc.title, "report");
        assert_eq!(doc.page_count(), 1);

        let page = &doc.pages[0];
        assert_eq!(page.content_lines().count(), 0);
        let title = &page.runs[0];
        assert_eq!(title.kind, RunKind::Title);
        assert_eq!(title.text, "report");
        assert_eq!(title.y, 792.0 - 50.0 - 18.0);
        assert_eq!(footer(page).map(|f| f.text.as_str()), Some("Page 1 of 1"));
    }

    #[test]
    fn test_whitespace_only_input_same_as_empty() {
        let doc = layout(" \n\n\t\n ", "notes.txt", &geometry()).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].content_lines().count(), 0);
    }

    // ── geometry validation ─────────────────────────────────────────────────

    #[test]
    fn test_invalid_geometry_rejected_before_layout() {
        let bad = PageGeometry {
            page_height: -10.0,
            ..PageGeometry::default()
        };
        let err = layout("Some text.", "a.txt", &bad).unwrap_err();
        assert!(matches!(err, LayoutError::Configuration(_)));
    }

    // ── first lines ─────────────────────────────────────────────────────────

    #[test]
    fn test_first_body_line_position() {
        let doc = layout("Hello there, world.", "a.txt", &geometry()).unwrap();
        let line = doc.pages[0].content_lines().next().unwrap();
        assert_eq!(line.kind, RunKind::Body);
        assert_eq!(line.face, FontFace::Regular);
        assert_eq!(line.size, 12.0);
        assert_eq!(line.x, 50.0);
        // 792 - 50 - 18 = 724 for the title, then 18 * 1.5 = 27 below it.
        assert_eq!(line.y, 697.0);
    }

    #[test]
    fn test_heading_uses_bold_larger_face_and_fixed_pitch() {
        let doc = layout("SUMMARY\n\nBody text follows here.", "a.txt", &geometry()).unwrap();
        let lines: Vec<&TextRun> = doc.pages[0].content_lines().collect();
        assert_eq!(lines[0].kind, RunKind::Heading);
        assert_eq!(lines[0].face, FontFace::Bold);
        assert!((lines[0].size - 14.4).abs() < 1e-4);
        assert_eq!(lines[1].kind, RunKind::Body);
        // Line pitch is body-based (18) plus a 12pt paragraph gap.
        assert_eq!(lines[0].y - lines[1].y, 18.0 + 12.0);
    }

    // ── word preservation & width bound ─────────────────────────────────────

    #[test]
    fn test_every_word_preserved_in_order() {
        let text = "Introduction:\n\nThe quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs.\n\n\
                    SECOND SECTION\n\n"
            .to_string()
            + &long_body(300);
        let doc = layout(&text, "a.txt", &geometry()).unwrap();
        let expected: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        assert_eq!(all_content_words(&doc), expected);
    }

    #[test]
    fn test_lines_fit_usable_width() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(60);
        let g = geometry();
        let doc = layout(&text, "a.txt", &g).unwrap();
        for line in doc.pages.iter().flat_map(|p| p.content_lines()) {
            assert!(
                width(line) <= g.usable_width(),
                "line too wide ({}): {:?}",
                width(line),
                line.text
            );
        }
    }

    #[test]
    fn test_latin1_heavy_lines_fit_usable_width() {
        // "ÆØÖß" = 1000 + 778 + 778 + 611 units = 38.004pt at 12pt, plus a
        // 3.336pt space: twelve words fit in 512pt, thirteen do not.
        let text = vec!["ÆØÖß"; 60].join(" ");
        let g = geometry();
        let doc = layout(&text, "a.txt", &g).unwrap();
        let lines: Vec<&TextRun> = doc.pages[0].content_lines().collect();
        assert_eq!(lines.len(), 5);
        for line in &lines {
            assert_eq!(line.text.split(' ').count(), 12);
            assert!(width(line) <= g.usable_width(), "line too wide: {}", width(line));
        }
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let giant = "x".repeat(200);
        let text = format!("short words before {giant} and after.");
        let doc = layout(&text, "a.txt", &geometry()).unwrap();
        let lines: Vec<&str> = doc.pages[0]
            .content_lines()
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(lines, vec!["short words before", giant.as_str(), "and after."]);
    }

    // ── pagination ──────────────────────────────────────────────────────────

    #[test]
    fn test_long_paragraph_splits_across_two_pages() {
        let g = geometry();
        let doc = layout(&long_body(800), "report.txt", &g).unwrap();

        let total_lines: usize = doc.pages.iter().map(|p| p.content_lines().count()).sum();
        assert!(total_lines > 41, "expected > 41 lines, got {total_lines}");
        assert_eq!(doc.page_count(), 2);

        // Page 1 takes every line whose baseline stays at or above the margin.
        let first: Vec<&TextRun> = doc.pages[0].content_lines().collect();
        assert_eq!(first.len(), 36);
        assert!(first.iter().all(|r| r.y >= g.margin));
        assert!(first.last().unwrap().y - g.line_height() < g.margin);

        // Page 2 restarts one body size below the top margin.
        let second_top = doc.pages[1].content_lines().next().unwrap();
        assert_eq!(second_top.y, 792.0 - 50.0 - 12.0);

        assert_eq!(
            footer(&doc.pages[0]).map(|f| f.text.as_str()),
            Some("Page 1 of 2")
        );
    }

    #[test]
    fn test_every_baseline_at_or_above_margin() {
        let text = (0..40)
            .map(|i| format!("Section {i}:\n\n{}", long_body(60)))
            .collect::<Vec<_>>()
            .join("\n\n");
        let g = geometry();
        let doc = layout(&text, "a.txt", &g).unwrap();
        assert!(doc.page_count() > 2);
        for run in doc.pages.iter().flat_map(|p| p.content_lines()) {
            assert!(run.y >= g.margin, "run below margin at y={}", run.y);
        }
    }

    #[test]
    fn test_title_only_on_first_page() {
        let doc = layout(&long_body(2000), "big.txt", &geometry()).unwrap();
        let titles: Vec<usize> = doc
            .pages
            .iter()
            .filter(|p| p.runs.iter().any(|r| r.kind == RunKind::Title))
            .map(|p| p.index)
            .collect();
        assert_eq!(titles, vec![0]);
    }

    // ── footers ─────────────────────────────────────────────────────────────

    #[test]
    fn test_footers_carry_accurate_totals() {
        let g = geometry();
        let doc = layout(&long_body(3000), "a.txt", &g).unwrap();
        let n = doc.page_count();
        assert!(n >= 3);
        for (i, page) in doc.pages.iter().enumerate() {
            assert_eq!(page.index, i);
            let footer = footer(page).unwrap();
            assert_eq!(footer.text, format!("Page {} of {}", i + 1, n));
            assert_eq!((footer.x, footer.y), (g.margin, g.margin / 2.0));
            assert_eq!(footer.size, 10.0);
            assert_eq!(footer.color, Rgb::FOOTER_GRAY);
            assert_eq!(page.runs.iter().filter(|r| r.kind == RunKind::Footer).count(), 1);
        }
    }

    // ── determinism ─────────────────────────────────────────────────────────

    #[test]
    fn test_layout_is_deterministic() {
        let text = "HEADER\n\nSome body. ".to_string() + &long_body(500);
        let a = layout(&text, "x.txt", &geometry()).unwrap();
        let b = layout(&text, "x.txt", &geometry()).unwrap();
        assert_eq!(a, b);
    }

    // ── wrap_words ──────────────────────────────────────────────────────────

    #[test]
    fn test_wrap_words_empty() {
        assert!(wrap_words(Vec::<&str>::new(), FontFace::Regular, 12.0, 100.0).is_empty());
    }

    #[test]
    fn test_wrap_words_seventeen_per_line() {
        // "word" is 26.004pt and a space 3.336pt at 12pt: 17 words fit in 512pt.
        let words = vec!["word"; 34];
        let lines = wrap_words(words, FontFace::Regular, 12.0, 512.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(' ').count(), 17);
    }
}
