//! Combines several PDFs into one, keeping input order.
//!
//! Each input is renumbered past the previous one so object ids never collide,
//! then its pages are re-parented under a single fresh page tree. Attributes a
//! page inherited from its old tree (resources, media box, ...) are copied onto
//! the page itself, since the old intermediate nodes are dropped.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::render::{finish_document, new_document, RenderError};

/// Page attributes that may be inherited from an ancestor `Pages` node.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in malformed input.
const MAX_TREE_DEPTH: usize = 64;

/// Merges `inputs` in order. Fails on the first input that does not parse.
pub fn merge_pdfs(inputs: Vec<Vec<u8>>) -> Result<Vec<u8>, RenderError> {
    if inputs.is_empty() {
        return Err(RenderError::NoInput);
    }

    let (mut merged, pages_id) = new_document();
    let mut next_id = merged.max_id + 1;
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut kids: Vec<ObjectId> = Vec::new();

    for (index, bytes) in inputs.iter().enumerate() {
        let invalid = |e: lopdf::Error| RenderError::InvalidPdf {
            index,
            detail: e.to_string(),
        };

        let mut doc = Document::load_mem(bytes).map_err(invalid)?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        debug!(index, pages = page_ids.len(), "Merging PDF input");

        let mut pages = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            let mut page = flatten_inherited(&doc, page_id).map_err(invalid)?;
            page.set("Parent", pages_id);
            pages.push((page_id, page));
        }

        for (id, object) in doc.objects {
            if !is_tree_node(&object) {
                objects.insert(id, object);
            }
        }
        for (page_id, page) in pages {
            objects.insert(page_id, Object::Dictionary(page));
            kids.push(page_id);
        }
    }

    merged.objects.extend(objects);
    merged.max_id = next_id;

    finish_document(merged, pages_id, kids, None)
}

/// Copies the page dictionary, filling in attributes inherited from its ancestors.
fn flatten_inherited(doc: &Document, page_id: ObjectId) -> Result<Dictionary, lopdf::Error> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(parent_id) = parent else { break };
        let node = doc.get_dictionary(parent_id)?;
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(page)
}

/// Catalog and page-tree nodes are rebuilt for the merged output.
fn is_tree_node(object: &Object) -> bool {
    let Ok(dict) = object.as_dict() else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog") | Ok(b"Pages") | Ok(b"Page")
    )
}
