//! Email messages as documents.
//!
//! The metadata is drawn from the RFC 5322 header block of the message:
//! `Message-ID` names the canonical file, `Subject` is the summary, and
//! `Date` is the creation time. The body is never interpreted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::document::{is_valid_id, Document};
use crate::error::DocumentError;
use crate::temporal::normalize_utc;

/// Suffix of canonically filed email messages.
pub const EMAIL_SUFFIX: &str = ".eml";

/// An email message stored as a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDocument {
    path: PathBuf,
    message_id: String,
    subject: String,
    date: DateTime<Utc>,
}

impl EmailDocument {
    /// Read and parse the message at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the file cannot be read,
    /// [`DocumentError::MissingHeader`] if `Message-ID` or `Date` is absent,
    /// [`DocumentError::InvalidId`] if `Message-ID` cannot name a file,
    /// and [`DocumentError::InvalidDate`] if `Date` is not RFC 2822.
    pub fn parse(path: &Path) -> Result<Self, DocumentError> {
        let bytes = fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_message(path.to_path_buf(), &String::from_utf8_lossy(&bytes))
    }

    /// Build a document from message text already in memory.
    ///
    /// # Errors
    ///
    /// See [`EmailDocument::parse`].
    pub fn from_message(path: PathBuf, message: &str) -> Result<Self, DocumentError> {
        let headers = parse_headers(message);

        let message_id = header(&headers, "Message-ID").ok_or_else(|| {
            DocumentError::MissingHeader {
                path: path.clone(),
                header: "Message-ID",
            }
        })?;
        let message_id = strip_angle_brackets(message_id).to_string();
        if !is_valid_id(&message_id) {
            return Err(DocumentError::InvalidId {
                path,
                id: message_id,
            });
        }

        let raw_date = header(&headers, "Date").ok_or_else(|| DocumentError::MissingHeader {
            path: path.clone(),
            header: "Date",
        })?;
        let date = parse_date(raw_date).ok_or_else(|| DocumentError::InvalidDate {
            path: path.clone(),
            value: raw_date.to_string(),
        })?;

        let subject = header(&headers, "Subject").unwrap_or_default().to_string();

        Ok(Self {
            path,
            message_id,
            subject,
            date,
        })
    }

    /// Boxed parser for the [`DocumentRegistry`](crate::registry::DocumentRegistry).
    ///
    /// # Errors
    ///
    /// See [`EmailDocument::parse`].
    pub fn parse_boxed(path: &Path) -> Result<Box<dyn Document>, DocumentError> {
        Ok(Box::new(Self::parse(path)?))
    }
}

impl Document for EmailDocument {
    fn id(&self) -> &str {
        &self.message_id
    }

    fn summary(&self) -> &str {
        &self.subject
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.date
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn suffix(&self) -> &str {
        EMAIL_SUFFIX
    }

    fn relocate(&mut self, path: PathBuf) {
        self.path = path;
    }
}

/// Unfolded `(name, value)` pairs from the header block, in message order.
fn parse_headers(message: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in message.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            break;
        }

        // Folded continuation of the previous header.
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }

        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    headers
}

/// First header named `name`, compared case-insensitively.
fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn strip_angle_brackets(value: &str) -> &str {
    let value = value.strip_prefix('<').unwrap_or(value);
    value.strip_suffix('>').unwrap_or(value)
}

/// RFC 2822 date, tolerating a trailing comment such as `(UTC)`.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc2822(value).or_else(|_| {
        let without_comment = match value.rfind('(') {
            Some(pos) if value.trim_end().ends_with(')') => value[..pos].trim_end(),
            _ => value,
        };
        DateTime::parse_from_rfc2822(without_comment)
    });
    parsed.ok().map(|date| normalize_utc(&date))
}
