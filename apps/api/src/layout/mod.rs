// Text layout: paragraph classification, greedy word-wrap and page filling.
// Pure and synchronous; HTTP callers run it inside tokio::task::spawn_blocking.

pub mod encoding;
pub mod engine;
pub mod font_metrics;
pub mod geometry;
pub mod paragraph;

// Re-export the public API consumed by the render and convert modules.
pub use encoding::encode_win_ansi;
pub use engine::{layout, LaidOutDocument, Page, Rgb, RunKind, TextRun};
pub use font_metrics::FontFace;
pub use geometry::{LayoutError, PageGeometry};
