//! Multipart upload collection shared by the conversion handlers.

use axum::extract::Multipart;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

/// Field names accepted as file parts. Anything else in the form is ignored.
const FILE_FIELDS: [&str; 3] = ["file", "files", "files[]"];

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Contents decoded as UTF-8, with invalid sequences replaced and any BOM dropped.
    pub fn text(&self) -> String {
        let text = String::from_utf8_lossy(&self.bytes);
        text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
    }
}

/// Reads every file part of the form, in submission order.
pub async fn collect_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if !FILE_FIELDS.contains(&name.as_str()) {
            debug!(field = %name, "Ignoring non-file form field");
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        debug!(
            field = %name,
            filename = filename.as_deref().unwrap_or("-"),
            size = bytes.len(),
            "Received upload part"
        );
        files.push(UploadedFile { filename, bytes });
    }
    Ok(files)
}

/// Wraps PDF bytes as a download named `<stem>.pdf`.
pub fn pdf_response(bytes: Vec<u8>, stem: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}.pdf\"", header_safe(stem));
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"document.pdf\""));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// Keeps printable ASCII except quotes and backslashes, which would break the header.
fn header_safe(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim().is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}
