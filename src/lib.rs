//! PDF Binder Library
//!
//! Binds arbitrary files into a PDF as embedded attachments.
//! This library provides functionality to:
//! - Copy a source PDF into a new document, either as a full structural clone
//!   or page by page
//! - Embed files into the document's embedded-file table
//! - Write the result atomically to its destination
//! - List and extract embedded files, count pages and outline entries
//!
//! # Example
//!
//! ```no_run
//! use pdf_binder::pdf::{AssembleOptions, Assembler, CloneStrategy};
//! use std::path::Path;
//!
//! let assembler = Assembler::new(AssembleOptions {
//!     strategy: CloneStrategy::Full,
//!     ..AssembleOptions::default()
//! });
//!
//! let report = assembler
//!     .assemble(
//!         Path::new("report.pdf"),
//!         &["invoice.pdf", "receipt.pdf"],
//!         Path::new("merged.pdf"),
//!     )
//!     .expect("Failed to assemble");
//! println!("Generated {}", report.display_name());
//! ```

pub mod attachment;
pub mod error;
pub mod pdf;

// Re-export commonly used items
pub use attachment::{Attachment, AttachmentSet};
pub use error::{AssemblyError, Error, Result};
pub use pdf::assemble;
