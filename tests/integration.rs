//! Integration tests for the PDF binder library

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_binder::pdf::{
    count_pages, extract_embedded_file, extract_metadata, list_embedded_files, outline_entry_count,
    AssembleOptions, Assembler, CloneStrategy,
};
use pdf_binder::{assemble, AssemblyError, Attachment, AttachmentSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a PDF with `pages` pages, a title and an outline of `bookmarks` items
fn write_source_pdf(path: &Path, pages: usize, bookmarks: usize) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(font);
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    let resources_id = doc.add_object(resources);

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for i in 0..pages {
        let content = format!("BT /F1 24 Tf 72 720 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page_ids.push(doc.add_object(page));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Kids", Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()));
    pages_dict.set("Count", Object::Integer(pages as i64));
    pages_dict.set("Resources", Object::Reference(resources_id));
    pages_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    if bookmarks > 0 {
        let outlines_id = doc.new_object_id();
        let item_ids: Vec<ObjectId> = (0..bookmarks).map(|_| doc.new_object_id()).collect();
        for (i, &id) in item_ids.iter().enumerate() {
            let target = page_ids[i % page_ids.len()];
            let mut item = Dictionary::new();
            item.set("Title", Object::string_literal(format!("Section {}", i + 1)));
            item.set("Parent", Object::Reference(outlines_id));
            item.set(
                "Dest",
                Object::Array(vec![Object::Reference(target), Object::Name(b"Fit".to_vec())]),
            );
            if let Some(&next) = item_ids.get(i + 1) {
                item.set("Next", Object::Reference(next));
            }
            doc.objects.insert(id, Object::Dictionary(item));
        }
        let mut outlines = Dictionary::new();
        outlines.set("Type", Object::Name(b"Outlines".to_vec()));
        outlines.set("First", Object::Reference(item_ids[0]));
        outlines.set("Last", Object::Reference(item_ids[bookmarks - 1]));
        outlines.set("Count", Object::Integer(bookmarks as i64));
        doc.objects.insert(outlines_id, Object::Dictionary(outlines));
        catalog.set("Outlines", Object::Reference(outlines_id));
    }

    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut info = Dictionary::new();
    info.set("Title", Object::string_literal("Quarterly Report"));
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));

    doc.save(path).expect("Failed to write source PDF");
}

/// Deterministic filler bytes of the given length
fn sample_bytes(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

fn embedded_names_and_sizes(path: &Path) -> Vec<(String, usize)> {
    let doc = Document::load(path).expect("Failed to load output PDF");
    list_embedded_files(&doc)
        .expect("Failed to list embedded files")
        .into_iter()
        .map(|file| {
            let size = file.data.len();
            (file.name, size)
        })
        .collect()
}

fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|entry| entry.expect("Failed to read entry").path())
        .collect();
    entries.sort();
    entries
}

#[test]
fn test_report_with_invoice_and_receipt() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("report.pdf");
    let invoice = temp_dir.path().join("invoice.pdf");
    let receipt = temp_dir.path().join("receipt.pdf");
    let merged = temp_dir.path().join("merged.pdf");

    write_source_pdf(&source, 3, 0);
    fs::write(&invoice, sample_bytes(500, 1)).unwrap();
    fs::write(&receipt, sample_bytes(200, 2)).unwrap();

    assemble(&source, &[&invoice, &receipt], &merged).expect("Failed to assemble");

    assert!(merged.exists(), "Merged PDF was not created");
    assert_eq!(count_pages(&merged).expect("Failed to count pages"), 3);
    assert_eq!(
        embedded_names_and_sizes(&merged),
        vec![("invoice.pdf".to_string(), 500), ("receipt.pdf".to_string(), 200)]
    );

    println!("✓ report.pdf bound with 2 attachments");
}

#[test]
fn test_attachments_extract_byte_for_byte() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    write_source_pdf(&source, 2, 0);

    let mut paths = Vec::new();
    for (i, size) in [1usize, 4096, 70_000].into_iter().enumerate() {
        let path = temp_dir.path().join(format!("blob{}.bin", i));
        fs::write(&path, sample_bytes(size, i as u8)).unwrap();
        paths.push(path);
    }

    let output = temp_dir.path().join("out.pdf");
    assemble(&source, &paths, &output).expect("Failed to assemble");

    let doc = Document::load(&output).expect("Failed to load output");
    for path in &paths {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let file = extract_embedded_file(&doc, &name)
            .expect("Failed to read embedded files")
            .unwrap_or_else(|| panic!("{} not embedded", name));
        assert_eq!(file.data, fs::read(path).unwrap(), "content mismatch for {}", name);
    }
}

#[test]
fn test_no_attachments_is_a_copy() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    let output = temp_dir.path().join("copy.pdf");
    write_source_pdf(&source, 4, 0);

    let no_attachments: [&Path; 0] = [];
    assemble(&source, &no_attachments, &output).expect("Failed to assemble");

    assert_eq!(count_pages(&output).unwrap(), count_pages(&source).unwrap());
    assert!(embedded_names_and_sizes(&output).is_empty());
}

#[test]
fn test_missing_attachment_leaves_no_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    let first = temp_dir.path().join("first.txt");
    let missing = temp_dir.path().join("second.txt");
    let third = temp_dir.path().join("third.txt");
    let output = temp_dir.path().join("out.pdf");

    write_source_pdf(&source, 1, 0);
    fs::write(&first, b"first").unwrap();
    fs::write(&third, b"third").unwrap();

    let result = assemble(&source, &[&first, &missing, &third], &output);

    match result {
        Err(AssemblyError::AttachmentUnreadable { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected AttachmentUnreadable, got {:?}", other),
    }
    assert!(!output.exists(), "No output should be written on failure");
}

#[test]
fn test_missing_source_leaves_no_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let attachment = temp_dir.path().join("a.txt");
    fs::write(&attachment, b"a").unwrap();
    let output = temp_dir.path().join("out.pdf");

    let result = assemble(&temp_dir.path().join("nonexistent.pdf"), &[&attachment], &output);

    assert!(
        matches!(result, Err(AssemblyError::SourceUnreadable { .. })),
        "Should fail with SourceUnreadable: {:?}",
        result
    );
    assert!(!output.exists());
}

#[test]
fn test_invalid_source_is_unreadable() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("notes.pdf");
    fs::write(&source, b"plain text pretending to be a PDF").unwrap();
    let output = temp_dir.path().join("out.pdf");

    let no_attachments: [&Path; 0] = [];
    let result = assemble(&source, &no_attachments, &output);

    assert!(matches!(result, Err(AssemblyError::SourceUnreadable { .. })));
    assert!(!output.exists());
}

#[test]
fn test_unwritable_destination_leaves_nothing_behind() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    write_source_pdf(&source, 1, 0);
    let output = temp_dir.path().join("no-such-dir").join("out.pdf");

    let no_attachments: [&Path; 0] = [];
    let result = assemble(&source, &no_attachments, &output);

    match result {
        Err(AssemblyError::DestinationUnwritable { path, .. }) => assert_eq!(path, output),
        other => panic!("expected DestinationUnwritable, got {:?}", other),
    }
    assert_eq!(dir_entries(temp_dir.path()), vec![source]);
}

#[test]
fn test_same_inputs_produce_identical_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    let attachment = temp_dir.path().join("data.csv");
    write_source_pdf(&source, 2, 2);
    fs::write(&attachment, b"id,value\n1,42\n").unwrap();

    let first = temp_dir.path().join("first.pdf");
    let second = temp_dir.path().join("second.pdf");
    assemble(&source, &[&attachment], &first).expect("Failed to assemble first");
    assemble(&source, &[&attachment], &second).expect("Failed to assemble second");

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_duplicate_names_empty_files_and_directories() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    write_source_pdf(&source, 1, 0);

    fs::create_dir(temp_dir.path().join("jan")).unwrap();
    fs::create_dir(temp_dir.path().join("feb")).unwrap();
    let jan = temp_dir.path().join("jan").join("data.txt");
    let feb = temp_dir.path().join("feb").join("data.txt");
    let empty = temp_dir.path().join("empty.bin");
    fs::write(&jan, b"january").unwrap();
    fs::write(&feb, b"february!").unwrap();
    fs::write(&empty, b"").unwrap();

    let output = temp_dir.path().join("out.pdf");
    assemble(&source, &[&jan, &feb, &empty], &output).expect("Failed to assemble");

    let doc = Document::load(&output).unwrap();
    let files = list_embedded_files(&doc).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["data.txt", "data.txt", "empty.bin"]);
    assert_eq!(files[0].data, b"january");
    assert_eq!(files[1].data, b"february!");
    assert!(files[2].data.is_empty());
}

#[test]
fn test_full_clone_keeps_outline_and_metadata() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    let attachment = temp_dir.path().join("a.txt");
    write_source_pdf(&source, 3, 2);
    fs::write(&attachment, b"a").unwrap();

    let output = temp_dir.path().join("full.pdf");
    assemble(&source, &[&attachment], &output).expect("Failed to assemble");

    let metadata = extract_metadata(&output).expect("Failed to read metadata");
    assert_eq!(metadata.page_count, 3);
    assert_eq!(metadata.title.as_deref(), Some("Quarterly Report"));
    assert_eq!(metadata.outline_entries, 2);
    assert_eq!(metadata.embedded_files, vec![("a.txt".to_string(), 1)]);
}

#[test]
fn test_pages_only_drops_outline() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    let attachment = temp_dir.path().join("a.txt");
    write_source_pdf(&source, 3, 2);
    fs::write(&attachment, b"a").unwrap();

    let assembler = Assembler::new(AssembleOptions {
        strategy: CloneStrategy::PagesOnly,
        ..AssembleOptions::default()
    });
    let output = temp_dir.path().join("pages.pdf");
    let report = assembler
        .assemble(&source, &[&attachment], &output)
        .expect("Failed to assemble");

    assert_eq!(report.page_count, 3);
    assert_eq!(report.strategy, CloneStrategy::PagesOnly);

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
    assert_eq!(outline_entry_count(&doc), 0);
    assert!(doc.trailer.get(b"Info").is_err());
    assert_eq!(list_embedded_files(&doc).unwrap().len(), 1);

    // MediaBox and Resources were pushed down from the old page tree
    for page_id in doc.get_pages().values() {
        let page = doc.get_dictionary(*page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }
}

#[test]
fn test_existing_attachments_survive_full_clone() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    let first = temp_dir.path().join("first.txt");
    let second = temp_dir.path().join("second.txt");
    write_source_pdf(&source, 1, 0);
    fs::write(&first, b"one").unwrap();
    fs::write(&second, b"two").unwrap();

    let once = temp_dir.path().join("once.pdf");
    let twice = temp_dir.path().join("twice.pdf");
    assemble(&source, &[&first], &once).expect("Failed first pass");
    assemble(&once, &[&second], &twice).expect("Failed second pass");

    assert_eq!(
        embedded_names_and_sizes(&twice),
        vec![("first.txt".to_string(), 3), ("second.txt".to_string(), 3)]
    );
}

#[test]
fn test_in_memory_attachments_uncompressed() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    write_source_pdf(&source, 1, 0);

    let set: AttachmentSet = [
        Attachment::new("résumé.txt", b"curriculum".to_vec()).unwrap(),
        Attachment::new("notes.md", b"# Notes\n".to_vec()).unwrap(),
    ]
    .into_iter()
    .collect();

    let assembler = Assembler::new(AssembleOptions {
        compress: false,
        record_modification_dates: false,
        ..AssembleOptions::default()
    });
    let output = temp_dir.path().join("memory.pdf");
    let report = assembler
        .assemble_set(&source, &set, &output)
        .expect("Failed to assemble");

    assert_eq!(report.display_name(), "memory.pdf");
    assert_eq!(
        report.embedded,
        vec![("résumé.txt".to_string(), 10), ("notes.md".to_string(), 8)]
    );
    assert_eq!(
        embedded_names_and_sizes(&output),
        vec![("résumé.txt".to_string(), 10), ("notes.md".to_string(), 8)]
    );
}

#[test]
fn test_overwrites_existing_destination() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let source = temp_dir.path().join("source.pdf");
    let output = temp_dir.path().join("out.pdf");
    write_source_pdf(&source, 2, 0);
    fs::write(&output, b"stale").unwrap();

    let no_attachments: [&Path; 0] = [];
    assemble(&source, &no_attachments, &output).expect("Failed to assemble");

    assert_eq!(count_pages(&output).unwrap(), 2);
    assert_eq!(dir_entries(temp_dir.path()), vec![output, source]);
}
