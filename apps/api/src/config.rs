use anyhow::{Context, Result};

use crate::layout::PageGeometry;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if a value is present but malformed, or if the page geometry is unusable.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on a whole multipart request body.
    pub max_upload_bytes: usize,
    /// Geometry for text conversion and image pages.
    pub geometry: PageGeometry,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut geometry = PageGeometry::default();
        if let Some(margin) = optional_env::<f32>("LAYOUT_MARGIN")? {
            geometry = geometry.with_margin(margin);
        }
        if let Some(font_size) = optional_env::<f32>("LAYOUT_FONT_SIZE")? {
            geometry = geometry.with_font_size(font_size);
        }
        geometry
            .validate()
            .context("LAYOUT_MARGIN / LAYOUT_FONT_SIZE describe an unusable page")?;

        Ok(Config {
            port: optional_env("PORT")?.unwrap_or(8080),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            geometry,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            geometry: PageGeometry::default(),
        }
    }
}

fn optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(None),
    }
}
