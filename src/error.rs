//! Error types for the PDF binder library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// General error type for inspection and extraction helpers
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// General error
    #[error("{0}")]
    General(String),
}

/// Failure of a single `assemble` call.
///
/// Every variant is terminal for the call that produced it. None of them
/// leave anything behind at the destination path.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// The source document is missing, unparseable or encrypted
    #[error("cannot read source document {}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        cause: SourceCause,
    },

    /// An attachment could not be opened or fully read
    #[error("cannot read attachment {}", .path.display())]
    AttachmentUnreadable {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    /// The output document could not be written
    #[error("cannot write output document {}", .path.display())]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        cause: DestinationCause,
    },
}

impl AssemblyError {
    /// Path of the file the failure is about
    pub fn path(&self) -> &std::path::Path {
        match self {
            AssemblyError::SourceUnreadable { path, .. }
            | AssemblyError::AttachmentUnreadable { path, .. }
            | AssemblyError::DestinationUnwritable { path, .. } => path,
        }
    }
}

/// Why a source document was rejected
#[derive(Error, Debug)]
pub enum SourceCause {
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),

    #[error("document is encrypted")]
    Encrypted,

    #[error("document has no page tree")]
    MissingPageTree,
}

/// Why the output document could not be produced
#[derive(Error, Debug)]
pub enum DestinationCause {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Building or serializing the output object graph failed
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),
}
