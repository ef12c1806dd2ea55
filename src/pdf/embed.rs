//! Writing attachments into a document's embedded-file table
//!
//! Attachments live in the `/EmbeddedFiles` name tree hanging off the
//! catalog's `/Names` dictionary. Each tree entry maps a key to a file
//! specification whose `/EF` dictionary points at the raw bytes:
//!
//! ```text
//! Catalog /Names -> << /EmbeddedFiles -> << /Names [ (key) filespec ... ] >> >>
//! filespec = << /Type /Filespec /F (name) /UF (name) /EF << /F stream >> >>
//! stream   = << /Type /EmbeddedFile /Params << /Size n /ModDate (D:...) >> >>
//! ```

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::attachment::Attachment;

/// Embed one attachment and return the id of its file specification
///
/// Entries are always appended; an existing entry with the same name is
/// left alone.
pub fn embed_attachment(
    doc: &mut Document,
    attachment: &Attachment,
    record_modification_date: bool,
) -> lopdf::Result<ObjectId> {
    let modified = attachment.modified().filter(|_| record_modification_date);
    let filespec_id = add_file_specification(doc, attachment.name(), attachment.content(), modified);
    append_entries(doc, vec![(encode_text_string(attachment.name()), filespec_id)])?;
    Ok(filespec_id)
}

/// Add the `/EmbeddedFile` stream and its `/Filespec` to the document
fn add_file_specification(
    doc: &mut Document,
    name: &str,
    content: &[u8],
    modified: Option<DateTime<Utc>>,
) -> ObjectId {
    let mut params = Dictionary::new();
    params.set("Size", Object::Integer(content.len() as i64));
    if let Some(modified) = modified {
        params.set("ModDate", Object::string_literal(format_pdf_date(&modified)));
    }

    let mut stream_dict = Dictionary::new();
    stream_dict.set("Type", Object::Name(b"EmbeddedFile".to_vec()));
    stream_dict.set("Params", Object::Dictionary(params));
    let stream_id = doc.add_object(Stream::new(stream_dict, content.to_vec()));

    let mut ef = Dictionary::new();
    ef.set("F", Object::Reference(stream_id));

    let mut filespec = Dictionary::new();
    filespec.set("Type", Object::Name(b"Filespec".to_vec()));
    filespec.set("F", Object::string_literal(encode_text_string(name)));
    filespec.set("UF", Object::string_literal(encode_text_string(name)));
    filespec.set("EF", Object::Dictionary(ef));
    doc.add_object(filespec)
}

/// Append `(key, filespec)` pairs to the `/EmbeddedFiles` tree
///
/// New keys go after the existing ones (or into a new last kid when the
/// root has `/Kids`) to keep the caller's order. Keys are therefore not
/// sorted across the tree as ISO 32000 name trees expect; lookups by key
/// that binary-search the tree may miss entries, a full walk does not.
fn append_entries(doc: &mut Document, entries: Vec<(Vec<u8>, ObjectId)>) -> lopdf::Result<()> {
    let root_id = embedded_files_root(doc)?;
    let root = doc.get_dictionary(root_id)?;
    let kids = root.get(b"Kids").ok().cloned();
    let names = root.get(b"Names").ok().cloned();

    if let Some(kids) = kids {
        // Intermediate root: hang the new entries off a fresh leaf.
        let leaf_id = doc.add_object(leaf_node(&entries));
        node_array_mut(doc, root_id, b"Kids", &kids)?.push(Object::Reference(leaf_id));
        return Ok(());
    }

    let pairs: Vec<Object> = entries
        .into_iter()
        .flat_map(|(key, id)| [Object::string_literal(key), Object::Reference(id)])
        .collect();
    match names {
        Some(names) => node_array_mut(doc, root_id, b"Names", &names)?.extend(pairs),
        None => {
            doc.get_dictionary_mut(root_id)?.set("Names", Object::Array(pairs));
        }
    }
    Ok(())
}

/// The array stored under `node[key]`, whether inline or indirect
///
/// `value` is the current value of that entry. Anything that is not an
/// array is an error rather than being overwritten.
fn node_array_mut<'a>(
    doc: &'a mut Document,
    node_id: ObjectId,
    key: &[u8],
    value: &Object,
) -> lopdf::Result<&'a mut Vec<Object>> {
    match value {
        Object::Reference(id) => doc.get_object_mut(*id)?.as_array_mut(),
        _ => doc.get_dictionary_mut(node_id)?.get_mut(key)?.as_array_mut(),
    }
}

fn leaf_node(entries: &[(Vec<u8>, ObjectId)]) -> Dictionary {
    let names = entries
        .iter()
        .flat_map(|(key, id)| [Object::string_literal(key.clone()), Object::Reference(*id)])
        .collect();

    let mut leaf = Dictionary::new();
    leaf.set("Names", Object::Array(names));
    if let (Some(low), Some(high)) = (
        entries.iter().map(|(key, _)| key).min(),
        entries.iter().map(|(key, _)| key).max(),
    ) {
        leaf.set(
            "Limits",
            Object::Array(vec![
                Object::string_literal(low.clone()),
                Object::string_literal(high.clone()),
            ]),
        );
    }
    leaf
}

/// Id of the `/EmbeddedFiles` root node, creating the path to it if needed
fn embedded_files_root(doc: &mut Document) -> lopdf::Result<ObjectId> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let names_id = ensure_indirect_dictionary(doc, catalog_id, b"Names")?;
    ensure_indirect_dictionary(doc, names_id, b"EmbeddedFiles")
}

/// Make `holder[key]` a reference to a dictionary object and return its id
///
/// Inline dictionaries are moved into their own object; a missing or
/// malformed value is replaced with an empty dictionary.
fn ensure_indirect_dictionary(doc: &mut Document, holder: ObjectId, key: &[u8]) -> lopdf::Result<ObjectId> {
    let current = doc.get_dictionary(holder)?.get(key).ok().cloned();

    let id = match current {
        Some(Object::Reference(id)) if doc.get_dictionary(id).is_ok() => return Ok(id),
        Some(Object::Dictionary(dict)) => doc.add_object(dict),
        Some(other) => {
            tracing::warn!(
                key = %String::from_utf8_lossy(key),
                value = ?other,
                "replacing malformed name dictionary entry"
            );
            doc.add_object(Dictionary::new())
        }
        None => doc.add_object(Dictionary::new()),
    };

    doc.get_dictionary_mut(holder)?.set(key.to_vec(), Object::Reference(id));
    Ok(id)
}

/// Encode `text` as a PDF text string
///
/// ASCII stays as is; anything else becomes UTF-16BE with a byte order mark.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

/// Decode a PDF text string written by any producer
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(body) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(body).into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        // PDFDocEncoding matches Latin-1 for printable characters
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Format a timestamp as a PDF date string, e.g. `D:20240131120000+00'00'`
pub fn format_pdf_date(date: &DateTime<Utc>) -> String {
    format!("D:{}+00'00'", date.format("%Y%m%d%H%M%S"))
}
