//! Opening the base document of an assembly

use std::path::{Path, PathBuf};

use lopdf::Document;

use crate::error::{AssemblyError, SourceCause};

/// A parsed source document
///
/// The file is read into memory in one go and closed again before `open`
/// returns; nothing here writes back to it.
#[derive(Debug)]
pub struct SourceDocument {
    path: PathBuf,
    document: Document,
}

impl SourceDocument {
    /// Parse and validate the document at `path`
    pub fn open(path: &Path) -> Result<Self, AssemblyError> {
        let unreadable = |cause: SourceCause| AssemblyError::SourceUnreadable {
            path: path.to_path_buf(),
            cause,
        };

        let document = Document::load(path).map_err(|e| unreadable(e.into()))?;

        if document.is_encrypted() {
            return Err(unreadable(SourceCause::Encrypted));
        }

        let has_page_tree = document
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(|pages| pages.as_reference())
            .and_then(|pages_id| document.get_dictionary(pages_id))
            .is_ok();
        if !has_page_tree {
            return Err(unreadable(SourceCause::MissingPageTree));
        }

        tracing::debug!(
            path = %path.display(),
            version = %document.version,
            pages = document.get_pages().len(),
            "opened source document"
        );

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub(crate) fn into_document(self) -> Document {
        self.document
    }
}
