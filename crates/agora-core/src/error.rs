//! Error types for Agora.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level result type for Agora operations.
pub type Result<T> = std::result::Result<T, AgoraError>;

/// Top-level error type for Agora.
#[derive(Debug, Error)]
pub enum AgoraError {
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("canonicalization error: {0}")]
    Canonicalize(#[from] CanonicalizeError),

    #[error("event error: {0}")]
    Event(#[from] EventError),

    #[error("data integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while resolving a file into a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no registered document type matches '{}'", .path.display())]
    UnknownType { path: PathBuf },

    #[error("'{}' has no {header} header", .path.display())]
    MissingHeader { path: PathBuf, header: &'static str },

    #[error("'{}' has an id '{id}' that cannot name a file", .path.display())]
    InvalidId { path: PathBuf, id: String },

    #[error("'{}' has an unparseable date '{value}'", .path.display())]
    InvalidDate { path: PathBuf, value: String },

    #[error("cannot read '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Errors raised while moving a document to its canonical path.
#[derive(Debug, Error)]
pub enum CanonicalizeError {
    #[error(
        "canonical path '{}' is already occupied{}",
        .canonical.display(),
        conflict_note(.identical)
    )]
    Conflict { canonical: PathBuf, identical: bool },

    #[error(
        "canonical path '{}' is outside the directory of '{}'",
        .canonical.display(),
        .source_path.display()
    )]
    OutsideDirectory {
        canonical: PathBuf,
        source_path: PathBuf,
    },

    #[error("source '{}' disappeared before it could be renamed", .source_path.display())]
    SourceMissing { source_path: PathBuf },

    #[error("cannot create placeholder '{}': {source}", .canonical.display())]
    Placeholder { canonical: PathBuf, source: io::Error },

    #[error(
        "cannot rename '{}' to '{}' (placeholder left in place): {source}",
        .from.display(),
        .to.display()
    )]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Errors raised while filing an event on disk.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event '{}' already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("cannot link '{}': {source}", .path.display())]
    Link { path: PathBuf, source: io::Error },

    #[error("cannot write metadata '{}': {source}", .path.display())]
    Metadata { path: PathBuf, source: MetadataError },

    #[error("cannot create '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// An entry in a collection that does not reconstruct as an event.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("'{entry}' is not a valid event id")]
    InvalidId { entry: String },

    #[error("event '{}' is incomplete (missing {missing})", .path.display())]
    Incomplete { path: PathBuf, missing: &'static str },

    #[error("cannot read document link '{}': {source}", .path.display())]
    Link { path: PathBuf, source: io::Error },

    #[error("cannot read metadata '{}': {source}", .path.display())]
    Metadata { path: PathBuf, source: MetadataError },

    #[error("cannot enumerate collection '{}': {source}", .path.display())]
    Collection { path: PathBuf, source: io::Error },
}

fn conflict_note(identical: &bool) -> &'static str {
    if *identical {
        " by a file with identical content"
    } else {
        ""
    }
}

impl IntegrityError {
    /// Whether a retry may succeed, e.g. an event observed mid-construction.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }
}

/// Errors from the ordered metadata codec.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("metadata document is not a mapping")]
    NotAMapping,
}
