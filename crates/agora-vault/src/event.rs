//! Events: timestamp-identified entries filing a document into a collection.
//!
//! On disk an event is a directory named by its identity:
//!
//! ```text
//! <collection>/
//!   2024-01-01-00:00:00/
//!     document        -> ../../inbox/1234@example.com.eml
//!     event.yaml
//! ```
//!
//! Events are immutable once filed. Any change requires a new event.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde_yaml::{Mapping, Value};

use agora_core::error::{EventError, IntegrityError};
use agora_core::metadata::{self, Metadata};
use agora_core::temporal::normalize_naive_utc;
use agora_core::Document;

use crate::identity::{format_id, parse_id};
use crate::paths::{normalize_lexically, relative_to, symlink};

/// Name of the symbolic link to the filed document.
pub const DOCUMENT_LINK: &str = "document";

/// Name of the metadata file.
pub const METADATA_FILE: &str = "event.yaml";

/// Name of the hidden directory a staged event for `id` is built in.
pub(crate) fn staging_name(id: &str) -> String {
    format!(".{id}.staging")
}

/// Whether `name` is a staging directory name for a valid identity.
pub(crate) fn is_staging_name(name: &str) -> bool {
    name.strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(".staging"))
        .is_some_and(|id| parse_id(id).is_some())
}

/// A chronological entry placing a document in a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    collection: PathBuf,
    document: PathBuf,
    timestamp: NaiveDateTime,
    metadata: Metadata,
}

impl Event {
    /// Create an in-memory event. The timestamp is normalized to naive UTC.
    pub fn new<Tz: TimeZone>(
        collection: impl Into<PathBuf>,
        document: impl Into<PathBuf>,
        timestamp: &DateTime<Tz>,
        metadata: Metadata,
    ) -> Self {
        Self {
            collection: collection.into(),
            document: document.into(),
            timestamp: normalize_naive_utc(timestamp),
            metadata,
        }
    }

    /// Derive an in-memory event from a document, timed by the document.
    pub fn from_document<D: Document + ?Sized>(
        collection: impl Into<PathBuf>,
        document: &D,
    ) -> Self {
        Self::from_document_at(collection, document, &document.timestamp())
    }

    /// Derive an in-memory event from a document at an explicit time.
    pub fn from_document_at<D: Document + ?Sized, Tz: TimeZone>(
        collection: impl Into<PathBuf>,
        document: &D,
        timestamp: &DateTime<Tz>,
    ) -> Self {
        Self::new(
            collection,
            document.path(),
            timestamp,
            Self::document_metadata(document),
        )
    }

    /// Metadata recorded for a document: its summary, and a `diff` noting
    /// that the document was added.
    pub fn document_metadata<D: Document + ?Sized>(document: &D) -> Metadata {
        let mut event = Mapping::new();
        event.insert("summary".into(), document.summary().into());

        let mut add = Mapping::new();
        add.insert("op".into(), "add".into());
        add.insert("path".into(), "/document".into());
        add.insert("value".into(), document.id().into());

        let mut metadata = Metadata::new();
        metadata.insert("event", event);
        metadata.insert("diff", vec![Value::Mapping(add)]);
        metadata
    }

    /// Reconstruct a filed event from its directory.
    ///
    /// The timestamp comes from `id`, so any sub-second precision the event
    /// had when it was filed is gone.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::InvalidId`] if `id` is not a canonical identity.
    /// - [`IntegrityError::Incomplete`] if the directory lacks its link or
    ///   metadata, as seen while an event is still being filed.
    ///   Metadata present without a link is [`IntegrityError::Link`].
    /// - [`IntegrityError::Link`] / [`IntegrityError::Metadata`] if either
    ///   cannot be read.
    pub fn from_filesystem(
        collection: impl Into<PathBuf>,
        id: &str,
    ) -> Result<Self, IntegrityError> {
        let collection = collection.into();
        let timestamp = parse_id(id).ok_or_else(|| IntegrityError::InvalidId {
            entry: id.to_string(),
        })?;

        let path = Self::path_for(&collection, id);
        let link = Self::document_path_for(&path);
        let target = fs::read_link(&link).map_err(|source| {
            // The link is written before the metadata, so metadata without a
            // link is damage rather than a filing in progress.
            let in_progress =
                path.is_dir() && Self::metadata_path_for(&path).symlink_metadata().is_err();
            if source.kind() == io::ErrorKind::NotFound && in_progress {
                IntegrityError::Incomplete {
                    path: path.clone(),
                    missing: DOCUMENT_LINK,
                }
            } else {
                IntegrityError::Link {
                    path: link.clone(),
                    source,
                }
            }
        })?;
        let document = normalize_lexically(&path.join(target));

        let metadata = Self::read_metadata(&path)?;

        Ok(Self {
            collection,
            document,
            timestamp,
            metadata,
        })
    }

    fn read_metadata(path: &Path) -> Result<Metadata, IntegrityError> {
        let metadata_path = Self::metadata_path_for(path);
        let incomplete = || IntegrityError::Incomplete {
            path: path.to_path_buf(),
            missing: METADATA_FILE,
        };
        let read_error = |source: io::Error| IntegrityError::Metadata {
            path: metadata_path.clone(),
            source: source.into(),
        };

        let file = match File::open(&metadata_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(incomplete()),
            Err(e) => return Err(read_error(e)),
        };
        // Created but not yet written.
        if file.metadata().map_err(read_error)?.len() == 0 {
            return Err(incomplete());
        }

        metadata::load(BufReader::new(file)).map_err(|source| IntegrityError::Metadata {
            path: metadata_path.clone(),
            source,
        })
    }

    pub fn collection(&self) -> &Path {
        &self.collection
    }

    /// Path of the referenced document.
    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Naive UTC timestamp.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Identity derived from the timestamp, e.g. `2024-01-01-00:00:00`.
    pub fn id(&self) -> String {
        format_id(&self.timestamp)
    }

    /// The `event.summary` metadata entry.
    pub fn summary(&self) -> Option<&str> {
        self.metadata.summary()
    }

    pub fn path_for(collection: &Path, id: &str) -> PathBuf {
        collection.join(id)
    }

    pub fn document_path_for(path: &Path) -> PathBuf {
        path.join(DOCUMENT_LINK)
    }

    pub fn metadata_path_for(path: &Path) -> PathBuf {
        path.join(METADATA_FILE)
    }

    /// `collection/id`
    pub fn path(&self) -> PathBuf {
        Self::path_for(&self.collection, &self.id())
    }

    /// `collection/id/document`
    pub fn document_path(&self) -> PathBuf {
        Self::document_path_for(&self.path())
    }

    /// `collection/id/event.yaml`
    pub fn metadata_path(&self) -> PathBuf {
        Self::metadata_path_for(&self.path())
    }

    /// Target of the document link, relative to the event directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the current directory is needed to anchor
    /// relative paths and cannot be determined.
    pub fn link_target(&self) -> io::Result<PathBuf> {
        relative_to(&self.document, &self.path())
    }

    /// File this event on disk: create the directory, link the document,
    /// then write the metadata.
    ///
    /// A failure after the directory exists leaves a partial event behind;
    /// use [`Event::create_staged`] when that is not acceptable.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::AlreadyExists`] if an event with the same
    /// identity is already filed, and other [`EventError`]s for I/O failures.
    pub fn create(&self) -> Result<(), EventError> {
        let path = self.path();
        Self::reserve(&path)?;
        self.populate(&path, &path)?;
        tracing::debug!(event = %path.display(), "filed event");
        Ok(())
    }

    /// File this event without ever exposing a partially written directory.
    ///
    /// The identity is reserved with an empty directory, the event is built
    /// in a hidden sibling `.{id}.staging`, and the staging directory is then
    /// renamed over the reservation. On failure the reservation is released
    /// and the staging directory is removed if this call created it. A
    /// staging directory left by an earlier run is reported, not touched.
    ///
    /// # Errors
    ///
    /// See [`Event::create`].
    pub fn create_staged(&self) -> Result<(), EventError> {
        let path = self.path();
        let staging = self.collection.join(staging_name(&self.id()));
        Self::reserve(&path)?;

        if let Err(source) = fs::create_dir(&staging) {
            Self::release(&path);
            return Err(EventError::Io {
                path: staging,
                source,
            });
        }

        let result = self.populate(&staging, &path).and_then(|()| {
            fs::rename(&staging, &path).map_err(|source| EventError::Io {
                path: path.clone(),
                source,
            })
        });

        if let Err(e) = result {
            tracing::debug!(event = %path.display(), error = %e, "rolling back staged event");
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                tracing::warn!(
                    staging = %staging.display(),
                    error = %cleanup,
                    "cannot remove staging directory"
                );
            }
            Self::release(&path);
            return Err(e);
        }
        tracing::debug!(event = %path.display(), "filed staged event");
        Ok(())
    }

    /// Remove the empty directory made by `reserve`.
    fn release(path: &Path) {
        if let Err(e) = fs::remove_dir(path) {
            tracing::warn!(event = %path.display(), error = %e, "cannot release reservation");
        }
    }

    fn reserve(path: &Path) -> Result<(), EventError> {
        fs::create_dir(path).map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                EventError::AlreadyExists {
                    path: path.to_path_buf(),
                }
            } else {
                EventError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }

    /// Write the link and metadata into `dir`, linking as if from `final_path`.
    fn populate(&self, dir: &Path, final_path: &Path) -> Result<(), EventError> {
        let link = Self::document_path_for(dir);
        let target =
            relative_to(&self.document, final_path).map_err(|source| EventError::Link {
                path: link.clone(),
                source,
            })?;
        symlink(&target, &link).map_err(|source| EventError::Link {
            path: link.clone(),
            source,
        })?;

        let metadata_path = Self::metadata_path_for(dir);
        let file = File::create(&metadata_path).map_err(|source| EventError::Io {
            path: metadata_path.clone(),
            source,
        })?;
        metadata::dump(&self.metadata, BufWriter::new(file)).map_err(|source| {
            EventError::Metadata {
                path: metadata_path.clone(),
                source,
            }
        })
    }
}
