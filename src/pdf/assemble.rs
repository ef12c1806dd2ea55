//! The document assembler: source document + attachments -> output document

use std::path::{Path, PathBuf};

use crate::attachment::AttachmentSet;
use crate::error::{AssemblyError, SourceCause};
use crate::pdf::clone::{clone_structure, CloneStrategy};
use crate::pdf::embed::embed_attachment;
use crate::pdf::source::SourceDocument;
use crate::pdf::write::write_atomically;

/// Options controlling how a document is assembled
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// How the source's structure is carried over
    pub strategy: CloneStrategy,
    /// Flate-compress streams that are not compressed yet
    pub compress: bool,
    /// Record each attachment file's modification time as `/ModDate`
    pub record_modification_dates: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            strategy: CloneStrategy::Full,
            compress: true,
            record_modification_dates: true,
        }
    }
}

/// What a successful assembly produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Where the output document was written
    pub destination: PathBuf,
    /// Pages in the output document
    pub page_count: usize,
    /// Name and size of every attachment embedded by this run, in order
    pub embedded: Vec<(String, usize)>,
    /// Strategy used to copy the source
    pub strategy: CloneStrategy,
}

impl AssemblyReport {
    /// Final path segment of the destination, for showing to the user
    pub fn display_name(&self) -> String {
        self.destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.destination.display().to_string())
    }
}

/// Runs assemblies with a fixed set of options
///
/// Holds no state between calls; one assembler can serve any number of
/// independent assemblies, also from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    options: AssembleOptions,
}

impl Assembler {
    pub fn new(options: AssembleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AssembleOptions {
        &self.options
    }

    /// Read the attachment files and assemble
    ///
    /// Attachments are read in order; the first unreadable one aborts the
    /// run before anything is written.
    pub fn assemble<P: AsRef<Path>>(
        &self,
        source: &Path,
        attachments: &[P],
        destination: &Path,
    ) -> Result<AssemblyReport, AssemblyError> {
        let source = SourceDocument::open(source)?;
        let attachments = AttachmentSet::from_paths(attachments)?;
        self.assemble_source(source, &attachments, destination)
    }

    /// Assemble from attachments that are already in memory
    pub fn assemble_set(
        &self,
        source: &Path,
        attachments: &AttachmentSet,
        destination: &Path,
    ) -> Result<AssemblyReport, AssemblyError> {
        let source = SourceDocument::open(source)?;
        self.assemble_source(source, attachments, destination)
    }

    fn assemble_source(
        &self,
        source: SourceDocument,
        attachments: &AttachmentSet,
        destination: &Path,
    ) -> Result<AssemblyReport, AssemblyError> {
        // A source that parses but whose structure cannot be rebuilt or
        // extended is still an unreadable source
        let source_path = source.path().to_path_buf();
        let malformed = |e: lopdf::Error| AssemblyError::SourceUnreadable {
            path: source_path.clone(),
            cause: SourceCause::Pdf(e),
        };

        let mut output = clone_structure(source, self.options.strategy).map_err(malformed)?;
        let page_count = output.get_pages().len();
        tracing::debug!(
            source = %source_path.display(),
            strategy = ?self.options.strategy,
            pages = page_count,
            "cloned source structure"
        );

        let mut embedded = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            embed_attachment(&mut output, attachment, self.options.record_modification_dates)
                .map_err(malformed)?;
            tracing::debug!(name = attachment.name(), bytes = attachment.len(), "embedded attachment");
            embedded.push((attachment.name().to_string(), attachment.len()));
        }

        if self.options.compress {
            output.compress();
        }

        write_atomically(&mut output, destination).map_err(|cause| AssemblyError::DestinationUnwritable {
            path: destination.to_path_buf(),
            cause,
        })?;

        tracing::info!(
            destination = %destination.display(),
            pages = page_count,
            attachments = embedded.len(),
            "assembled document"
        );

        Ok(AssemblyReport {
            destination: destination.to_path_buf(),
            page_count,
            embedded,
            strategy: self.options.strategy,
        })
    }
}

/// Assemble `source` and the files at `attachments` into `destination`
///
/// Uses the default options: full clone of the source, compressed streams,
/// modification dates recorded. On error nothing is created or changed at
/// `destination`.
///
/// # Example
///
/// ```no_run
/// use pdf_binder::assemble;
/// use std::path::Path;
///
/// assemble(
///     Path::new("report.pdf"),
///     &["invoice.pdf", "receipt.pdf"],
///     Path::new("merged.pdf"),
/// ).expect("Failed to assemble");
/// ```
pub fn assemble<P: AsRef<Path>>(
    source: &Path,
    attachments: &[P],
    destination: &Path,
) -> Result<(), AssemblyError> {
    Assembler::default()
        .assemble(source, attachments, destination)
        .map(|_| ())
}
