//! # agora-vault
//!
//! The event-filing protocol for Agora collections.
//!
//! A collection is a directory of events. Each event is a directory named by
//! its timestamp-derived identity, holding a `document` symlink and an
//! `event.yaml` metadata file. The collection directory is the authoritative
//! record; there is no index beyond enumerating it.
//!
//! - [`Event`]: deriving, filing, and reconstructing events
//! - [`file_document`]: parse, canonicalize and file one document file
//! - [`identity`]: the identity format
//! - [`load_collection`]: the ordered history of a collection

pub mod collection;
pub mod event;
pub mod filing;
pub mod identity;
mod paths;

pub use collection::{
    load_collection, load_collection_with, IntegrityPolicy, LoadOptions, LoadedCollection,
};
pub use event::{Event, DOCUMENT_LINK, METADATA_FILE};
pub use filing::{file_document, FileOptions};
pub use identity::{format_id, parse_id, ID_FORMAT};
