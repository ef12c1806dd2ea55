//! Attachments to be embedded into an output document

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use glob::glob;

use crate::error::{AssemblyError, Error, Result};

/// A named blob of bytes destined for the embedded-file table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    content: Vec<u8>,
    modified: Option<DateTime<Utc>>,
    origin: Option<PathBuf>,
}

impl Attachment {
    /// Create an attachment from bytes already in memory
    ///
    /// Returns `None` when `name` is empty.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            content,
            modified: None,
            origin: None,
        })
    }

    /// Read a file into an attachment named after its final path segment
    ///
    /// The file is opened once and read to the end through that single
    /// handle; the handle is closed before returning.
    pub fn read(path: &Path) -> io::Result<Self> {
        let name = attachment_name(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path has no file name: {}", path.display()),
            )
        })?;

        let mut file = File::open(path)?;
        let metadata = file.metadata()?;
        if metadata.is_dir() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "is a directory"));
        }

        let mut content = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut content)?;

        Ok(Self {
            name,
            content,
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            origin: Some(path.to_path_buf()),
        })
    }

    /// Name under which the attachment is embedded
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw bytes of the attachment
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Last modification time of the originating file, if known
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Attach a modification time to an in-memory attachment
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Path the attachment was read from, if it came from disk
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Ordered attachments; names may repeat and every entry is kept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentSet {
    attachments: Vec<Attachment>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every path in order, stopping at the first unreadable file
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> std::result::Result<Self, AssemblyError> {
        let mut set = Self::new();
        for path in paths {
            let path = path.as_ref();
            let attachment = Attachment::read(path).map_err(|cause| AssemblyError::AttachmentUnreadable {
                path: path.to_path_buf(),
                cause,
            })?;
            tracing::debug!(name = attachment.name(), bytes = attachment.len(), "read attachment");
            set.push(attachment);
        }
        Ok(set)
    }

    pub fn push(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attachment> {
        self.attachments.iter()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Attachment names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.attachments.iter().map(Attachment::name).collect()
    }
}

impl FromIterator<Attachment> for AttachmentSet {
    fn from_iter<I: IntoIterator<Item = Attachment>>(iter: I) -> Self {
        Self {
            attachments: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AttachmentSet {
    type Item = &'a Attachment;
    type IntoIter = std::slice::Iter<'a, Attachment>;

    fn into_iter(self) -> Self::IntoIter {
        self.attachments.iter()
    }
}

/// Final path segment of `path`, without any directory components
pub fn attachment_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Expand glob patterns into paths
///
/// Matches of a single pattern are sorted; the order of the patterns
/// themselves is kept. Arguments without glob characters are taken literally
/// so that a missing file is reported when it is read.
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        if !(pattern.contains('*') || pattern.contains('?') || pattern.contains('[')) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let entries = glob(pattern).map_err(|e| Error::InvalidGlob(format!("{pattern}: {e}")))?;
        let mut matched = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => matched.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("glob error for {}: {}", pattern, e),
            }
        }
        if matched.is_empty() {
            return Err(Error::NoFilesMatched(pattern.to_string()));
        }
        matched.sort();
        paths.extend(matched);
    }

    Ok(paths)
}
