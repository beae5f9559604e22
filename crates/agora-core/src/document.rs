//! Document capability: the source material filed into collections.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::canonical;
use crate::error::CanonicalizeError;

/// A source document stored as a file on disk.
///
/// Concrete document types (email messages, future formats) implement this
/// trait; the filing protocol depends only on these operations.
pub trait Document: std::fmt::Debug {
    /// Stable external identifier, used to name the canonical file.
    fn id(&self) -> &str;

    /// Short human-readable description.
    fn summary(&self) -> &str;

    /// Intrinsic creation time, normalized to UTC.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Current on-disk location.
    fn path(&self) -> &Path;

    /// Fixed filename suffix identifying the parser, including the dot.
    fn suffix(&self) -> &str;

    /// Rebind this document to a new on-disk location.
    ///
    /// Only the canonicalizer calls this, after it has moved the file.
    fn relocate(&mut self, path: PathBuf);

    /// `dirname(path)/{id}{suffix}`.
    fn canonical_path(&self) -> PathBuf {
        let dir = self.path().parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("{}{}", self.id(), self.suffix()))
    }

    /// Whether the document already lives at its canonical path.
    fn is_canonical(&self) -> bool {
        self.path() == self.canonical_path()
    }

    /// Move the document to its canonical path. See [`canonical::canonicalize`].
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizeError`] if the move cannot be completed safely.
    fn canonicalize(self) -> Result<Self, CanonicalizeError>
    where
        Self: Sized,
    {
        canonical::canonicalize(self)
    }
}

/// Whether `id` can name a file inside the document's own directory.
///
/// Rejects empty ids, `.` and `..`, and anything containing a path
/// separator or NUL.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', '\0'])
}

impl<D: Document + ?Sized> Document for Box<D> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn summary(&self) -> &str {
        (**self).summary()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        (**self).timestamp()
    }

    fn path(&self) -> &Path {
        (**self).path()
    }

    fn suffix(&self) -> &str {
        (**self).suffix()
    }

    fn relocate(&mut self, path: PathBuf) {
        (**self).relocate(path);
    }

    fn canonical_path(&self) -> PathBuf {
        (**self).canonical_path()
    }
}
