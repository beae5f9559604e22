//! Filing a document file end to end: parse, canonicalize, create the event.

use std::path::Path;

use chrono::{DateTime, FixedOffset};

use agora_core::{Document, DocumentRegistry, Result};

use crate::event::Event;

/// Options for [`file_document`].
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// File at this time instead of the document's own timestamp.
    pub at: Option<DateTime<FixedOffset>>,
    /// Build the event with [`Event::create_staged`].
    pub staged: bool,
}

/// Parse `path` through `registry`, move it to its canonical path, and file
/// it as an event in `collection`.
///
/// The document is canonicalized before the event is created, so a failed
/// event leaves the document at its canonical path.
///
/// # Errors
///
/// Returns [`AgoraError::Document`](agora_core::AgoraError::Document) if the
/// file cannot be parsed,
/// [`AgoraError::Canonicalize`](agora_core::AgoraError::Canonicalize) if it
/// cannot be moved, and [`AgoraError::Event`](agora_core::AgoraError::Event)
/// if the event cannot be created.
pub fn file_document(
    registry: &DocumentRegistry,
    collection: &Path,
    path: &Path,
    options: &FileOptions,
) -> Result<Event> {
    let document = registry.parse(path)?.canonicalize()?;

    let event = match &options.at {
        Some(at) => Event::from_document_at(collection, &document, at),
        None => Event::from_document(collection, &document),
    };
    if options.staged {
        event.create_staged()?;
    } else {
        event.create()?;
    }

    tracing::info!(event = %event.id(), document = %document.path().display(), "filed");
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{AgoraError, DocumentError};
    use std::fs;

    fn deliver(dir: &Path, name: &str, id: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(
            &path,
            format!("Message-ID: <{id}>\nSubject: {id}\nDate: Mon, 1 Jan 2024 00:00:00 +0000\n\n"),
        )
        .unwrap();
        path
    }

    #[test]
    fn files_at_document_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = deliver(dir.path(), "new.eml", "doc-A");

        let event = file_document(
            &DocumentRegistry::with_defaults(),
            dir.path(),
            &path,
            &FileOptions::default(),
        )
        .unwrap();

        assert_eq!(event.id(), "2024-01-01-00:00:00");
        assert_eq!(event.document(), dir.path().join("doc-A.eml").as_path());
        assert!(event.metadata_path().exists());
    }

    #[test]
    fn files_staged_at_explicit_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = deliver(dir.path(), "new.eml", "doc-A");
        let options = FileOptions {
            at: Some(DateTime::parse_from_rfc3339("2024-06-01T12:00:00+02:00").unwrap()),
            staged: true,
        };

        let event =
            file_document(&DocumentRegistry::with_defaults(), dir.path(), &path, &options)
                .unwrap();

        assert_eq!(event.id(), "2024-06-01-10:00:00");
        assert!(event.document_path().is_symlink());
    }

    #[test]
    fn unknown_type_surfaces_as_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain").unwrap();

        let err = file_document(
            &DocumentRegistry::with_defaults(),
            dir.path(),
            &path,
            &FileOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AgoraError::Document(DocumentError::UnknownType { .. })
        ));
        assert!(path.exists());
    }
}
