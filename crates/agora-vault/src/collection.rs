//! Loading the full, ordered history of a collection.
//!
//! A collection is a directory whose entries are event directories. Loading
//! is a full rescan: every entry is reconstructed and the result is sorted
//! by timestamp. Staging directories (`.{id}.staging`) belong to filing in
//! progress and are passed over; any other entry must be an event.

use std::fs;
use std::path::Path;

use agora_core::error::IntegrityError;

use crate::event::{is_staging_name, Event};

/// What to do with an entry that does not reconstruct as an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegrityPolicy {
    /// Abort the load on the first bad entry.
    #[default]
    FailFast,
    /// Log a warning, record the entry, and keep loading.
    SkipAndWarn,
}

/// Options for loading a collection.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub policy: IntegrityPolicy,
}

impl LoadOptions {
    #[must_use]
    pub fn skip_invalid() -> Self {
        Self {
            policy: IntegrityPolicy::SkipAndWarn,
        }
    }
}

/// Result of loading a collection.
#[derive(Debug, Default)]
pub struct LoadedCollection {
    /// Events in ascending timestamp order.
    pub events: Vec<Event>,
    /// Entries that failed to load under [`IntegrityPolicy::SkipAndWarn`].
    pub skipped: Vec<IntegrityError>,
}

/// Load every event in `collection`, failing on the first bad entry.
///
/// # Errors
///
/// Returns the [`IntegrityError`] of the first entry that does not
/// reconstruct, or [`IntegrityError::Collection`] if the directory cannot
/// be read.
pub fn load_collection(collection: &Path) -> Result<Vec<Event>, IntegrityError> {
    load_collection_with(collection, &LoadOptions::default()).map(|loaded| loaded.events)
}

/// Load every event in `collection` under the given options.
///
/// # Errors
///
/// Returns [`IntegrityError::Collection`] if the directory cannot be read,
/// and, under [`IntegrityPolicy::FailFast`], the first entry's error.
pub fn load_collection_with(
    collection: &Path,
    options: &LoadOptions,
) -> Result<LoadedCollection, IntegrityError> {
    let enumerate_error = |source| IntegrityError::Collection {
        path: collection.to_path_buf(),
        source,
    };

    let mut loaded = LoadedCollection::default();
    for entry in fs::read_dir(collection).map_err(enumerate_error)? {
        let name = entry.map_err(enumerate_error)?.file_name();
        let name = name.to_string_lossy();
        if is_staging_name(&name) {
            tracing::debug!(entry = %name, "skipping staged event in progress");
            continue;
        }

        match Event::from_filesystem(collection, &name) {
            Ok(event) => loaded.events.push(event),
            Err(e) => match options.policy {
                IntegrityPolicy::FailFast => return Err(e),
                IntegrityPolicy::SkipAndWarn => {
                    tracing::warn!(
                        collection = %collection.display(),
                        entry = %name,
                        error = %e,
                        "skipping entry that is not a valid event"
                    );
                    loaded.skipped.push(e);
                }
            },
        }
    }

    loaded.events.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| a.id().cmp(&b.id()))
    });
    tracing::debug!(
        collection = %collection.display(),
        events = loaded.events.len(),
        skipped = loaded.skipped.len(),
        "loaded collection"
    );
    Ok(loaded)
}
