// PDF serialization and document utilities built on lopdf.
// Every function here is CPU-bound and synchronous; handlers call them via spawn_blocking.

pub mod images;
pub mod merge;
pub mod pdf;

use lopdf::{dictionary, Document, Object, ObjectId, StringFormat};
use thiserror::Error;

use crate::layout::encode_win_ansi;

pub use images::images_to_pdf;
pub use merge::merge_pdfs;
pub use pdf::write_pdf;

const PDF_VERSION: &str = "1.5";
const PRODUCER: &str = "Stapler";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No input documents were provided")]
    NoInput,

    #[error("Input #{index} is not a readable PDF: {detail}")]
    InvalidPdf { index: usize, detail: String },

    #[error("Input #{index} is not a supported image: {detail}")]
    InvalidImage { index: usize, detail: String },

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF serialization failed: {0}")]
    Serialize(String),
}

/// Creates an empty document and reserves the id of its page tree root.
pub(crate) fn new_document() -> (Document, ObjectId) {
    let mut pdf = Document::with_version(PDF_VERSION);
    let pages_id = pdf.new_object_id();
    (pdf, pages_id)
}

/// Writes the page tree, catalog and info dictionary, then serializes.
///
/// Every id in `kids` must already be a page whose `Parent` is `pages_id`.
pub(crate) fn finish_document(
    mut pdf: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    title: Option<&str>,
) -> Result<Vec<u8>, RenderError> {
    let count = kids.len() as i64;
    let kids: Vec<Object> = kids.into_iter().map(Object::Reference).collect();
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);

    let mut info = dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
    };
    if let Some(title) = title {
        info.set("Title", win_ansi_string(title));
    }
    let info_id = pdf.add_object(info);
    pdf.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    pdf.save_to(&mut buf)
        .map_err(|e| RenderError::Serialize(e.to_string()))?;
    Ok(buf)
}

/// Literal string in the WinAnsiEncoding of the standard fonts.
pub(crate) fn win_ansi_string(text: &str) -> Object {
    Object::String(encode_win_ansi(text), StringFormat::Literal)
}
