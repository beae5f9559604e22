//! Ordered metadata documents and their YAML codec.
//!
//! Event metadata is an ordered key-value document written as YAML.
//! Format:
//! ```yaml
//! ---
//! event:
//!   summary: Quarterly report
//! diff:
//! - op: add
//!   path: /document
//!   value: 1234@example.com
//! ```
//!
//! Keys keep their insertion order through a dump/load cycle, and nested
//! mappings are written as plain block mappings so the files stay easy to
//! edit by hand.

use std::io::{Read, Write};

use serde_yaml::{Mapping, Value};

use crate::error::MetadataError;

/// Document-start marker written before every metadata document.
const DOCUMENT_START: &str = "---\n";

/// An ordered key-value metadata document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(Mapping);

impl Metadata {
    /// Create an empty metadata document.
    #[must_use]
    pub fn new() -> Self {
        Self(Mapping::new())
    }

    /// Insert a top-level entry, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(Value::String(key.into()), value.into())
    }

    /// Look up a top-level entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a nested entry by walking mappings along `path`.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.get(*key))
    }

    /// The `event.summary` entry, if present and a string.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.get_path(&["event", "summary"]).and_then(Value::as_str)
    }

    /// Iterate over top-level entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    /// Render as a YAML document with an explicit `---` start marker.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Yaml`] if a value cannot be represented.
    pub fn to_yaml_string(&self) -> Result<String, MetadataError> {
        let yaml = serde_yaml::to_string(&self.0)?;

        let mut output = String::with_capacity(DOCUMENT_START.len() + yaml.len());
        output.push_str(DOCUMENT_START);
        output.push_str(&yaml);
        Ok(output)
    }

    /// Parse a single YAML document whose top level is a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Yaml`] for malformed YAML and
    /// [`MetadataError::NotAMapping`] if the document is not a mapping.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MetadataError> {
        Self::from_value(serde_yaml::from_str(yaml)?)
    }

    fn from_value(value: Value) -> Result<Self, MetadataError> {
        match value {
            Value::Mapping(mapping) => Ok(Self(mapping)),
            _ => Err(MetadataError::NotAMapping),
        }
    }
}

/// Write `metadata` to `writer` as a block-style YAML document.
///
/// # Errors
///
/// Returns [`MetadataError`] if serialization or the write fails.
pub fn dump<W: Write>(metadata: &Metadata, mut writer: W) -> Result<(), MetadataError> {
    writer.write_all(metadata.to_yaml_string()?.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read one metadata document from `reader`.
///
/// # Errors
///
/// Returns [`MetadataError`] if the input is unreadable, malformed, or not
/// a mapping.
pub fn load<R: Read>(reader: R) -> Result<Metadata, MetadataError> {
    Metadata::from_value(serde_yaml::from_reader(reader)?)
}
