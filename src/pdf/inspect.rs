//! Reading back documents: page counts, outline, metadata and attachments

use std::collections::HashSet;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::error::{Error, Result};
use crate::pdf::embed::decode_text_string;

/// An attachment found in a document's embedded-file table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    /// File name from the file specification
    pub name: String,
    /// Decoded content
    pub data: Vec<u8>,
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Number of outline items (bookmarks)
    pub outline_entries: usize,
    /// Names and sizes of embedded files, in table order
    pub embedded_files: Vec<(String, usize)>,
}

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc
        .catalog()
        .map_err(|_| Error::General("No catalog in document".to_string()))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| Error::General("No Pages reference in catalog".to_string()))?;

    let pages_dict = doc.get_dictionary(pages_id)?;

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) => Ok(*n as usize),
        Ok(_) => Err(Error::General("Count is not an integer".to_string())),
        Err(_) => Err(Error::General("No Count in Pages".to_string())),
    }
}

fn load(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    Ok(Document::load(path)?)
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    let doc = load(path)?;

    let page_count = count_pages_from_catalog(&doc)?;
    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    let info = doc
        .trailer
        .get(b"Info")
        .and_then(|info| doc.dereference(info))
        .and_then(|(_, info)| info.as_dict())
        .ok();
    let info_text = |key: &[u8]| {
        info.and_then(|dict| dict.get(key).ok())
            .and_then(|value| value.as_str().ok())
            .map(decode_text_string)
    };

    let embedded_files = list_embedded_files(&doc)?
        .into_iter()
        .map(|file| {
            let size = file.data.len();
            (file.name, size)
        })
        .collect();

    Ok(PdfMetadata {
        page_count,
        title: info_text(b"Title"),
        author: info_text(b"Author"),
        outline_entries: outline_entry_count(&doc),
        embedded_files,
    })
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = load(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(page_count)
}

/// Number of items in the document outline, at any depth
pub fn outline_entry_count(doc: &Document) -> usize {
    let first = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Outlines"))
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .and_then(|outlines| outlines.get(b"First"))
        .and_then(Object::as_reference);

    let mut visited = HashSet::new();
    let mut pending: Vec<ObjectId> = first.into_iter().collect();
    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Ok(item) = doc.get_dictionary(id) else {
            continue;
        };
        for key in [b"First".as_slice(), b"Next".as_slice()] {
            if let Ok(next) = item.get(key).and_then(Object::as_reference) {
                pending.push(next);
            }
        }
    }
    visited.len()
}

/// All embedded files, in name tree order
///
/// Duplicated names are all returned.
pub fn list_embedded_files(doc: &Document) -> Result<Vec<EmbeddedFile>> {
    let root = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Names"))
        .and_then(|names| doc.dereference(names))
        .and_then(|(_, names)| names.as_dict())
        .and_then(|names| names.get(b"EmbeddedFiles"));
    let Ok(root) = root else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    collect_name_tree(doc, root, &mut entries, &mut visited)?;

    entries
        .into_iter()
        .map(|(key, filespec)| read_file_specification(doc, &key, filespec))
        .collect()
}

/// First embedded file called `name`
pub fn extract_embedded_file(doc: &Document, name: &str) -> Result<Option<EmbeddedFile>> {
    Ok(list_embedded_files(doc)?.into_iter().find(|file| file.name == name))
}

/// Depth-first walk over a name tree node, collecting `(key, value)` pairs
fn collect_name_tree<'a>(
    doc: &'a Document,
    node: &'a Object,
    entries: &mut Vec<(Vec<u8>, &'a Object)>,
    visited: &mut HashSet<ObjectId>,
) -> Result<()> {
    let (id, node) = doc.dereference(node)?;
    if let Some(id) = id {
        if !visited.insert(id) {
            return Ok(());
        }
    }
    let node = node.as_dict()?;

    if let Some(names) = node_array(doc, node, b"Names") {
        for pair in names.chunks_exact(2) {
            match pair[0].as_str() {
                Ok(key) => entries.push((key.to_vec(), &pair[1])),
                Err(_) => tracing::warn!("skipping name tree entry with non-string key"),
            }
        }
    }
    if let Some(kids) = node_array(doc, node, b"Kids") {
        for kid in kids {
            collect_name_tree(doc, kid, entries, visited)?;
        }
    }
    Ok(())
}

/// `node[key]` as an array, following a reference if the array is indirect
fn node_array<'a>(doc: &'a Document, node: &'a lopdf::Dictionary, key: &[u8]) -> Option<&'a Vec<Object>> {
    let value = node.get(key).ok()?;
    doc.dereference(value).ok()?.1.as_array().ok()
}

fn read_file_specification(doc: &Document, key: &[u8], filespec: &Object) -> Result<EmbeddedFile> {
    let (_, filespec) = doc.dereference(filespec)?;
    let filespec = filespec.as_dict()?;

    let name = filespec
        .get(b"UF")
        .or_else(|_| filespec.get(b"F"))
        .and_then(Object::as_str)
        .map(decode_text_string)
        .unwrap_or_else(|_| decode_text_string(key));

    let stream_ref = filespec
        .get(b"EF")
        .and_then(|ef| doc.dereference(ef))
        .and_then(|(_, ef)| ef.as_dict())
        .and_then(|ef| ef.get(b"UF").or_else(|_| ef.get(b"F")))
        .map_err(|_| Error::General(format!("embedded file {name} has no /EF stream")))?;
    let (_, stream) = doc.dereference(stream_ref)?;
    let stream = stream.as_stream()?;

    let data = if stream.dict.has(b"Filter") {
        stream.decompressed_content()?
    } else {
        stream.content.clone()
    };

    Ok(EmbeddedFile { name, data })
}
