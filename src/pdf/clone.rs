//! Building the output document from a source document
//!
//! Two strategies are offered. [`CloneStrategy::Full`] keeps the source's
//! whole object graph (outline, forms, info dictionary, existing
//! attachments) with its object numbering intact. [`CloneStrategy::PagesOnly`]
//! rebuilds a minimal catalog and page tree around the source pages, in the
//! spirit of the lopdf merge example, and drops everything else.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::pdf::source::SourceDocument;

/// How the source's structure is carried into the output document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloneStrategy {
    /// Copy the complete object graph
    #[default]
    Full,
    /// Copy pages and what they reference, nothing else
    PagesOnly,
}

/// Page attributes that may be inherited from ancestors in the page tree
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Trailer keys that describe the source file's layout and must not be
/// written into a freshly serialized file. Sources with cross-reference
/// streams hand over the stream dictionary as their trailer.
const STALE_TRAILER_KEYS: [&[u8]; 9] = [
    b"Prev",
    b"XRefStm",
    b"Encrypt",
    b"Type",
    b"W",
    b"Index",
    b"Filter",
    b"DecodeParms",
    b"Length",
];

/// Turn a source document into an output document
pub fn clone_structure(source: SourceDocument, strategy: CloneStrategy) -> lopdf::Result<Document> {
    match strategy {
        CloneStrategy::Full => Ok(full_clone(source.into_document())),
        CloneStrategy::PagesOnly => copy_pages(source.into_document()),
    }
}

fn full_clone(mut doc: Document) -> Document {
    for key in STALE_TRAILER_KEYS {
        doc.trailer.remove(key);
    }
    doc
}

fn copy_pages(source: Document) -> lopdf::Result<Document> {
    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

    // Resolve inherited attributes before the old page tree goes away
    let inherited: Vec<Vec<(Vec<u8>, Object)>> = page_ids
        .iter()
        .map(|&page_id| inherited_attributes(&source, page_id))
        .collect();

    let mut out = Document::with_version(source.version.clone());
    out.max_id = source.max_id;
    out.objects = source.objects;

    let pages_id = out.new_object_id();

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = out.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    out.objects.insert(catalog_id, Object::Dictionary(catalog));
    out.objects.insert(pages_id, Object::Dictionary(pages_object));
    out.trailer.set("Root", Object::Reference(catalog_id));

    for (&page_id, attributes) in page_ids.iter().zip(inherited) {
        let page = out.get_dictionary_mut(page_id)?;
        page.set("Parent", Object::Reference(pages_id));
        for (key, value) in attributes {
            page.set(key, value);
        }
    }

    let pruned = out.prune_objects();
    tracing::debug!(pages = page_ids.len(), pruned = pruned.len(), "copied pages into new page tree");

    Ok(out)
}

/// Inheritable attributes a page lacks but one of its ancestors defines
///
/// The nearest ancestor wins.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let Ok(page) = doc.get_dictionary(page_id) else {
        return found;
    };

    let mut visited = HashSet::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    while let Some(node_id) = parent {
        if !visited.insert(node_id) {
            tracing::warn!(?node_id, "cycle in page tree");
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE_ATTRIBUTES {
            if page.has(key) || found.iter().any(|(k, _)| k.as_slice() == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    found
}
