//! Moving documents to their canonical paths.
//!
//! A document's canonical path is `dirname(path)/{id}{suffix}`. The move is
//! built from two atomic primitives so that a concurrent canonicalizer never
//! clobbers an existing canonical file and never observes a half-renamed
//! state:
//!
//! 1. exclusively create an empty placeholder at the canonical path;
//! 2. rename the original file over the placeholder.
//!
//! On failure the original file is never lost. If the source vanished
//! between the two steps the placeholder is removed again; any other rename
//! failure leaves the placeholder in place for inspection.

use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::document::Document;
use crate::error::CanonicalizeError;

/// Move `document` to its canonical path and return it rebound there.
///
/// A document already at its canonical path is returned unchanged without
/// touching the filesystem.
///
/// # Errors
///
/// - [`CanonicalizeError::OutsideDirectory`] if the id would place the file
///   anywhere but beside the original.
/// - [`CanonicalizeError::Conflict`] if the canonical path is occupied.
/// - [`CanonicalizeError::Placeholder`] if the placeholder cannot be created.
/// - [`CanonicalizeError::SourceMissing`] if the source vanished mid-move.
/// - [`CanonicalizeError::Rename`] for any other rename failure.
pub fn canonicalize<D: Document>(mut document: D) -> Result<D, CanonicalizeError> {
    let original = document.path().to_path_buf();
    let canonical = document.canonical_path();
    if original == canonical {
        return Ok(document);
    }
    if !stays_beside(&original, &canonical, &document) {
        return Err(CanonicalizeError::OutsideDirectory {
            canonical,
            source_path: original,
        });
    }

    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&canonical)
    {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let identical = same_content(&original, &canonical);
            return Err(CanonicalizeError::Conflict {
                canonical,
                identical,
            });
        }
        Err(source) => {
            return Err(CanonicalizeError::Placeholder { canonical, source });
        }
    }
    tracing::debug!(placeholder = %canonical.display(), "reserved canonical path");

    if let Err(source) = fs::rename(&original, &canonical) {
        if source.kind() == io::ErrorKind::NotFound {
            // The placeholder is ours; put the directory back the way it was.
            fs::remove_file(&canonical).map_err(|e| CanonicalizeError::Rename {
                from: original.clone(),
                to: canonical.clone(),
                source: e,
            })?;
            return Err(CanonicalizeError::SourceMissing {
                source_path: original,
            });
        }
        return Err(CanonicalizeError::Rename {
            from: original,
            to: canonical,
            source,
        });
    }
    tracing::debug!(
        from = %original.display(),
        to = %canonical.display(),
        "canonicalized document"
    );

    document.relocate(canonical);
    Ok(document)
}

/// Whether `canonical` is exactly `{id}{suffix}` in the directory of `original`.
fn stays_beside<D: Document>(original: &Path, canonical: &Path, document: &D) -> bool {
    let file_name = format!("{}{}", document.id(), document.suffix());
    canonical.parent() == original.parent()
        && canonical.file_name() == Some(OsStr::new(&file_name))
}

/// Whether two files have the same SHA-256 digest. Unreadable files never match.
fn same_content(a: &Path, b: &Path) -> bool {
    match (file_digest(a), file_digest(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn file_digest(path: &Path) -> io::Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    Ok(Sha256::digest(&bytes).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::Note;

    fn note_in(dir: &Path, name: &str, id: &str, content: &str) -> Note {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        Note {
            id: id.to_string(),
            path,
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn moves_document_to_canonical_path() {
        let dir = tempfile::tempdir().unwrap();
        let note = note_in(dir.path(), "incoming.note", "abc", "hello");

        let note = canonicalize(note).unwrap();

        assert_eq!(note.path, dir.path().join("abc.note"));
        assert_eq!(fs::read_to_string(&note.path).unwrap(), "hello");
        assert_eq!(entries(dir.path()), ["abc.note"]);
    }

    #[test]
    fn canonical_document_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let note = note_in(dir.path(), "abc.note", "abc", "hello");
        let before = fs::metadata(&note.path).unwrap().modified().unwrap();

        let note = canonicalize(note).unwrap();

        assert_eq!(note.path, dir.path().join("abc.note"));
        assert_eq!(entries(dir.path()), ["abc.note"]);
        let after = fs::metadata(&note.path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn refuses_to_clobber_existing_canonical_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("abc.note"), "original").unwrap();
        let note = note_in(dir.path(), "incoming.note", "abc", "newcomer");

        let err = canonicalize(note).unwrap_err();

        assert!(matches!(
            err,
            CanonicalizeError::Conflict {
                identical: false,
                ..
            }
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("abc.note")).unwrap(),
            "original"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("incoming.note")).unwrap(),
            "newcomer"
        );
    }

    #[test]
    fn conflict_reports_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("abc.note"), "same").unwrap();
        let note = note_in(dir.path(), "copy.note", "abc", "same");

        let err = canonicalize(note).unwrap_err();

        assert!(matches!(
            err,
            CanonicalizeError::Conflict {
                identical: true,
                ..
            }
        ));
        assert_eq!(entries(dir.path()), ["abc.note", "copy.note"]);
    }

    #[test]
    fn missing_source_removes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let note = Note {
            id: "abc".to_string(),
            path: dir.path().join("vanished.note"),
        };

        let err = canonicalize(note).unwrap_err();

        assert!(matches!(err, CanonicalizeError::SourceMissing { .. }));
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn placeholder_failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let note = Note {
            id: "abc".to_string(),
            path: dir.path().join("no-such-dir").join("x.note"),
        };

        let err = canonicalize(note).unwrap_err();

        assert!(matches!(err, CanonicalizeError::Placeholder { .. }));
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn id_outside_the_directory_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let inbox = dir.path().join("inbox");
        fs::create_dir(&inbox).unwrap();
        let note = note_in(&inbox, "incoming.note", "../escaped", "hello");

        let err = canonicalize(note).unwrap_err();

        assert!(matches!(err, CanonicalizeError::OutsideDirectory { .. }));
        assert_eq!(entries(dir.path()), ["inbox"]);
        assert_eq!(entries(&inbox), ["incoming.note"]);
    }

    #[test]
    fn failed_rename_leaves_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("incoming.note");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("inner"), "content").unwrap();
        let note = Note {
            id: "abc".to_string(),
            path: source.clone(),
        };

        let err = canonicalize(note).unwrap_err();

        assert!(matches!(err, CanonicalizeError::Rename { .. }));
        let placeholder = dir.path().join("abc.note");
        assert!(placeholder.is_file());
        assert_eq!(fs::metadata(&placeholder).unwrap().len(), 0);
        assert_eq!(fs::read_to_string(source.join("inner")).unwrap(), "content");
    }

    #[test]
    fn boxed_documents_canonicalize() {
        let dir = tempfile::tempdir().unwrap();
        let note: Box<dyn Document> =
            Box::new(note_in(dir.path(), "incoming.note", "abc", "hello"));

        let note = note.canonicalize().unwrap();

        assert_eq!(note.path(), dir.path().join("abc.note").as_path());
        assert!(!dir.path().join("incoming.note").exists());
    }
}
