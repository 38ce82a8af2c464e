//! Serializes laid-out pages into a PDF byte stream.
//!
//! Each layout `Page` becomes one PDF page of the configured size. Text is set
//! in the standard Helvetica faces, so no font programs are embedded and the
//! widths measured by the layout engine are exactly what a viewer renders.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::layout::{FontFace, LaidOutDocument, Page, PageGeometry, TextRun};
use crate::render::{finish_document, new_document, win_ansi_string, RenderError};

/// Renders every page of `doc` into a single PDF.
pub fn write_pdf(doc: &LaidOutDocument, geometry: &PageGeometry) -> Result<Vec<u8>, RenderError> {
    let (mut pdf, pages_id) = new_document();
    let resources_id = add_font_resources(&mut pdf);
    let media_box = media_box(geometry);

    let mut kids = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let content = page_content(page)
            .encode()
            .map_err(|e| RenderError::Serialize(e.to_string()))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id);
    }

    finish_document(pdf, pages_id, kids, Some(&doc.title))
}

/// `[0 0 width height]` for the configured page size.
pub(crate) fn media_box(geometry: &PageGeometry) -> Vec<Object> {
    vec![
        Object::Integer(0),
        Object::Integer(0),
        geometry.page_width.into(),
        geometry.page_height.into(),
    ]
}

fn add_font_resources(pdf: &mut Document) -> ObjectId {
    let mut fonts = Dictionary::new();
    for face in [FontFace::Regular, FontFace::Bold] {
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    pdf.add_object(dictionary! { "Font" => fonts })
}

fn page_content(page: &Page) -> Content {
    let operations: Vec<Operation> = page.runs.iter().flat_map(run_operations).collect();
    Content { operations }
}

fn run_operations(run: &TextRun) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(run.face.resource_name().as_bytes().to_vec()),
                run.size.into(),
            ],
        ),
        Operation::new(
            "rg",
            vec![run.color.r.into(), run.color.g.into(), run.color.b.into()],
        ),
        Operation::new("Td", vec![run.x.into(), run.y.into()]),
        Operation::new("Tj", vec![win_ansi_string(&run.text)]),
        Operation::new("ET", vec![]),
    ]
}
