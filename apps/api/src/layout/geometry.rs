//! Page geometry for the text layout engine.
//!
//! All values are in layout units (PDF points). The defaults describe a US
//! letter page with 50pt margins and a 12pt body, and must stay at these exact
//! values so output matches previously generated documents.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised before any layout work begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Invalid page geometry: {0}")]
    Configuration(String),
}

/// Page dimensions, margins and type sizes used by a single layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    /// Body text size. Also drives the fixed line pitch.
    pub font_size: f32,
    pub heading_font_size: f32,
    pub title_font_size: f32,
    /// Line pitch = `font_size * line_height_factor`.
    pub line_height_factor: f32,
    pub footer_font_size: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry {
            page_width: 612.0,
            page_height: 792.0,
            margin: 50.0,
            font_size: 12.0,
            heading_font_size: 12.0 * 1.2,
            title_font_size: 18.0,
            line_height_factor: 1.5,
            footer_font_size: 10.0,
        }
    }
}

impl PageGeometry {
    /// Letter geometry with a different body size. Heading size follows at 1.2×.
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self.heading_font_size = font_size * 1.2;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Maximum rendered width of a line.
    pub fn usable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * self.line_height_factor
    }

    /// Rejects geometry that leaves no drawable area.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let positive = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("margin", self.margin),
            ("font_size", self.font_size),
            ("heading_font_size", self.heading_font_size),
            ("title_font_size", self.title_font_size),
            ("line_height_factor", self.line_height_factor),
            ("footer_font_size", self.footer_font_size),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::Configuration(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if self.margin * 2.0 >= self.page_width {
            return Err(LayoutError::Configuration(format!(
                "margin {} leaves no usable width on a {}pt wide page",
                self.margin, self.page_width
            )));
        }
        if self.margin * 2.0 >= self.page_height {
            return Err(LayoutError::Configuration(format!(
                "margin {} leaves no usable height on a {}pt tall page",
                self.margin, self.page_height
            )));
        }
        Ok(())
    }
}
