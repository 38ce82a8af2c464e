use crate::config::Config;
use crate::layout::PageGeometry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState { config }
    }

    /// Geometry used for text conversion and image pages.
    pub fn geometry(&self) -> &PageGeometry {
        &self.config.geometry
    }
}
