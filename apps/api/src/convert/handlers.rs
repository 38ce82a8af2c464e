use axum::{
    extract::{Multipart, State},
    response::Response,
};
use tracing::info;

use crate::convert::upload::{collect_files, pdf_response, UploadedFile};
use crate::errors::AppError;
use crate::layout::layout;
use crate::render::{images_to_pdf, merge_pdfs, write_pdf};
use crate::state::AppState;

const DEFAULT_TEXT_FILENAME: &str = "document.txt";

/// POST /api/v1/convert/text
pub async fn handle_convert_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let file = collect_files(multipart)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;

    let filename = file
        .filename
        .clone()
        .unwrap_or_else(|| DEFAULT_TEXT_FILENAME.to_string());
    let text = file.text();
    let geometry = state.geometry().clone();

    let (title, pages, bytes) = run_blocking("text conversion", move || {
        let doc = layout(&text, &filename, &geometry)?;
        let bytes = write_pdf(&doc, &geometry)?;
        let pages = doc.page_count();
        Ok((doc.title, pages, bytes))
    })
    .await?;

    info!(title = %title, pages, size = bytes.len(), "Converted text to PDF");
    Ok(pdf_response(bytes, &title))
}

/// POST /api/v1/convert/images
pub async fn handle_convert_images(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let files = collect_files(multipart).await?;
    if files.is_empty() {
        return Err(AppError::Validation(
            "at least one image file is required".to_string(),
        ));
    }

    let count = files.len();
    let geometry = state.geometry().clone();
    let bytes = run_blocking("image conversion", move || {
        Ok(images_to_pdf(into_bytes(files), &geometry)?)
    })
    .await?;

    info!(images = count, size = bytes.len(), "Converted images to PDF");
    Ok(pdf_response(bytes, "photos"))
}

/// POST /api/v1/merge
pub async fn handle_merge(multipart: Multipart) -> Result<Response, AppError> {
    let files = collect_files(multipart).await?;
    if files.len() < 2 {
        return Err(AppError::Validation(format!(
            "at least two PDF files are required to merge, got {}",
            files.len()
        )));
    }

    let count = files.len();
    let bytes = run_blocking("PDF merge", move || Ok(merge_pdfs(into_bytes(files))?)).await?;

    info!(inputs = count, size = bytes.len(), "Merged PDFs");
    Ok(pdf_response(bytes, "combined"))
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn into_bytes(files: Vec<UploadedFile>) -> Vec<Vec<u8>> {
    files.into_iter().map(|f| f.bytes.to_vec()).collect()
}

/// Runs CPU-bound layout/PDF work off the async executor.
async fn run_blocking<T, F>(what: &'static str, work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in {what}: {e}")))?
}
