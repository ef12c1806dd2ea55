//! Serializing the output document to its destination
//!
//! The document is written to a temporary file next to the destination and
//! renamed over it once every byte is on disk, so the destination either
//! keeps its previous state or holds the complete new document.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::Document;
use tempfile::Builder;

use crate::error::DestinationCause;

/// Write `doc` to `destination`, replacing any existing file
pub fn write_atomically(doc: &mut Document, destination: &Path) -> Result<(), DestinationCause> {
    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropping the temp file on any early return deletes it
    let mut temp = temp_file_builder().tempfile_in(directory)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        doc.save_to(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    if let Ok(existing) = fs::metadata(destination) {
        temp.as_file().set_permissions(existing.permissions())?;
    }

    temp.persist(destination).map_err(|e| e.error)?;
    tracing::debug!(path = %destination.display(), "output document written");
    Ok(())
}

/// New outputs get the mode `File::create` would give them: 0o666 with
/// the process umask applied at creation.
#[cfg(unix)]
fn temp_file_builder() -> Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;
    let mut builder = Builder::new();
    builder.permissions(fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn temp_file_builder() -> Builder<'static, 'static> {
    Builder::new()
}
