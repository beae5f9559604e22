//! Explicit registry of document parsers keyed by filename suffix.

use std::path::Path;

use crate::document::Document;
use crate::email::{EmailDocument, EMAIL_SUFFIX};
use crate::error::DocumentError;

/// Constructor producing a document from a file on disk.
pub type Parser = fn(&Path) -> Result<Box<dyn Document>, DocumentError>;

/// Maps filename suffixes to document parsers.
///
/// Registries are constructed explicitly and passed to the code that
/// resolves files into documents; there is no process-wide parser table.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    parsers: Vec<(String, Parser)>,
}

impl DocumentRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in document type (`.eml`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(EMAIL_SUFFIX, EmailDocument::parse_boxed);
        registry
    }

    /// Register `parser` for files ending in `suffix`.
    ///
    /// Re-registering a suffix replaces its parser in place.
    pub fn register(&mut self, suffix: impl Into<String>, parser: Parser) -> &mut Self {
        let suffix = suffix.into();
        match self.parsers.iter_mut().find(|(s, _)| *s == suffix) {
            Some(entry) => entry.1 = parser,
            None => self.parsers.push((suffix, parser)),
        }
        self
    }

    /// Registered suffixes in registration order.
    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.parsers.iter().map(|(s, _)| s.as_str())
    }

    /// Parse the file at `path` with the first parser whose suffix matches.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnknownType`] if no suffix matches, or
    /// whatever the matching parser reports.
    pub fn parse(&self, path: &Path) -> Result<Box<dyn Document>, DocumentError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        let parser = self
            .parsers
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix.as_str()))
            .map(|(_, parser)| parser)
            .ok_or_else(|| DocumentError::UnknownType {
                path: path.to_path_buf(),
            })?;

        parser(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn refuse(path: &Path) -> Result<Box<dyn Document>, DocumentError> {
        Err(DocumentError::UnknownType {
            path: path.to_path_buf(),
        })
    }

    #[test]
    fn defaults_register_email() {
        let registry = DocumentRegistry::with_defaults();
        assert_eq!(registry.suffixes().collect::<Vec<_>>(), [".eml"]);
    }

    #[test]
    fn unknown_suffix_is_rejected() {
        let registry = DocumentRegistry::with_defaults();
        let err = registry.parse(Path::new("inbox/notes.txt")).unwrap_err();
        assert!(matches!(err, DocumentError::UnknownType { .. }));
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = DocumentRegistry::new();
        let err = registry.parse(Path::new("inbox/x.eml")).unwrap_err();
        assert!(matches!(err, DocumentError::UnknownType { .. }));
    }

    #[test]
    fn dispatches_on_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incoming.eml");
        fs::write(
            &path,
            "Message-ID: <a@b>\nSubject: hi\nDate: Tue, 2 Jan 2024 10:00:00 +0000\n\nbody\n",
        )
        .unwrap();

        let doc = DocumentRegistry::with_defaults().parse(&path).unwrap();
        assert_eq!(doc.id(), "a@b");
        assert_eq!(doc.suffix(), ".eml");
    }

    #[test]
    fn re_registering_replaces_parser() {
        let mut registry = DocumentRegistry::with_defaults();
        registry.register(".eml", refuse).register(".mbox", refuse);

        assert_eq!(registry.suffixes().collect::<Vec<_>>(), [".eml", ".mbox"]);
        assert!(registry.parse(Path::new("x.eml")).is_err());
    }
}
