//! PDF manipulation module

pub mod assemble;
pub mod clone;
pub mod embed;
pub mod inspect;
pub mod source;
pub mod write;

// Re-export commonly used items
pub use assemble::{assemble, AssembleOptions, Assembler, AssemblyReport};
pub use clone::CloneStrategy;
pub use inspect::{
    count_pages, extract_embedded_file, extract_metadata, list_embedded_files, outline_entry_count,
    EmbeddedFile, PdfMetadata,
};
pub use source::SourceDocument;
