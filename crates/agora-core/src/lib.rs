//! # agora-core
//!
//! Core types for the Agora document archive.
//!
//! This crate defines what the filing protocol is built on:
//! - [`Document`]: the capability every archived source provides
//! - [`DocumentRegistry`]: explicit suffix → parser mapping
//! - [`EmailDocument`]: email messages as documents
//! - [`canonicalize`]: moving a document to its canonical path
//! - [`Metadata`]: ordered metadata documents and their YAML codec
//! - Time normalization ([`temporal`])
//! - Error hierarchy ([`AgoraError`] and its domain errors)

pub mod canonical;
pub mod document;
pub mod email;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod temporal;

pub use canonical::canonicalize;
pub use document::Document;
pub use email::EmailDocument;
pub use error::{
    AgoraError, CanonicalizeError, DocumentError, EventError, IntegrityError, MetadataError,
    Result,
};
pub use metadata::Metadata;
pub use registry::DocumentRegistry;
