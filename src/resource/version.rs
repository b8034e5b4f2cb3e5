//! Resource versions and `If-Match` preconditions.
//!
//! A resource's version is the opaque value carried in `meta.version`. When a
//! handler does not supply one, the engine derives it from the serialized
//! resource content with SHA-256, so identical content always yields the same
//! version.
//!
//! Two phantom formats keep header text and stored values apart:
//!
//! * [`HttpVersion`] renders as a weak ETag, `W/"abc123"`
//! * [`RawVersion`] renders as the bare opaque value, `abc123`
//!
//! ```rust
//! use scim_engine::resource::version::{HttpVersion, RawVersion};
//!
//! let stored = RawVersion::from_content(br#"{"id":"1","userName":"bjensen"}"#);
//! let header = HttpVersion::from(stored.clone()).to_string();
//! let parsed: HttpVersion = header.parse().unwrap();
//! assert_eq!(parsed, stored);
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, marker::PhantomData, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy)]
pub struct Http;

#[derive(Debug, Clone, Copy)]
pub struct Raw;

/// Opaque version identifier, tagged with its textual format.
#[derive(Debug, Clone, Eq, Hash)]
pub struct ScimVersion<Format> {
    opaque: String,
    _format: PhantomData<Format>,
}

/// Weak ETag form, as found in `If-Match` headers and `meta.version`.
pub type HttpVersion = ScimVersion<Http>;

/// Bare opaque value.
pub type RawVersion = ScimVersion<Raw>;

impl<Format> ScimVersion<Format> {
    /// Derive a version from resource content.
    ///
    /// The first 8 bytes of the SHA-256 digest are base64 encoded to keep
    /// ETags short.
    pub fn from_content(content: &[u8]) -> RawVersion {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let hash = hasher.finalize();

        ScimVersion {
            opaque: BASE64.encode(&hash[..8]),
            _format: PhantomData,
        }
    }

    /// Wrap a handler-supplied identifier (sequence number, timestamp, ...).
    pub fn from_hash(hash_string: impl AsRef<str>) -> RawVersion {
        ScimVersion {
            opaque: hash_string.as_ref().to_string(),
            _format: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.opaque
    }
}

impl fmt::Display for ScimVersion<Raw> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opaque)
    }
}

impl fmt::Display for ScimVersion<Http> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W/\"{}\"", self.opaque)
    }
}

impl FromStr for ScimVersion<Raw> {
    type Err = VersionError;

    fn from_str(version_str: &str) -> Result<Self, Self::Err> {
        let trimmed = version_str.trim();
        if trimmed.is_empty() {
            return Err(VersionError::ParseError(
                "Version string cannot be empty".to_string(),
            ));
        }

        Ok(ScimVersion {
            opaque: trimmed.to_string(),
            _format: PhantomData,
        })
    }
}

impl FromStr for ScimVersion<Http> {
    type Err = VersionError;

    fn from_str(etag_header: &str) -> Result<Self, Self::Err> {
        let trimmed = etag_header.trim();
        let etag_value = trimmed.strip_prefix("W/").unwrap_or(trimmed);

        let opaque = etag_value
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .filter(|inner| !inner.is_empty())
            .ok_or_else(|| VersionError::InvalidEtagFormat(etag_header.to_string()))?;

        Ok(ScimVersion {
            opaque: opaque.to_string(),
            _format: PhantomData,
        })
    }
}

impl From<ScimVersion<Raw>> for ScimVersion<Http> {
    fn from(raw: ScimVersion<Raw>) -> Self {
        ScimVersion {
            opaque: raw.opaque,
            _format: PhantomData,
        }
    }
}

impl From<ScimVersion<Http>> for ScimVersion<Raw> {
    fn from(http: ScimVersion<Http>) -> Self {
        ScimVersion {
            opaque: http.opaque,
            _format: PhantomData,
        }
    }
}

impl<F1, F2> PartialEq<ScimVersion<F2>> for ScimVersion<F1> {
    fn eq(&self, other: &ScimVersion<F2>) -> bool {
        self.opaque == other.opaque
    }
}

impl<Format> Serialize for ScimVersion<Format> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.opaque.serialize(serializer)
    }
}

impl<'de, Format> Deserialize<'de> for ScimVersion<Format> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opaque = String::deserialize(deserializer)?;
        Ok(ScimVersion {
            opaque,
            _format: PhantomData,
        })
    }
}

/// Parse a stored `meta.version` value, which may be a weak ETag or a bare value.
pub fn parse_stored_version(value: &str) -> Result<RawVersion, VersionError> {
    match value.parse::<HttpVersion>() {
        Ok(http) => Ok(http.into()),
        Err(_) => value.parse::<RawVersion>(),
    }
}

/// Evaluate an `If-Match` header against the current version.
///
/// The header may list several ETags separated by commas; `*` matches any
/// existing resource.
pub fn check_if_match(if_match: &str, current: &RawVersion) -> Result<(), VersionConflict> {
    let mut first_expected = None;
    for candidate in if_match.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if candidate == "*" {
            return Ok(());
        }
        let expected = match candidate.parse::<HttpVersion>() {
            Ok(http) => RawVersion::from(http),
            Err(_) => RawVersion::from_hash(candidate),
        };
        if expected == *current {
            return Ok(());
        }
        first_expected.get_or_insert(expected);
    }

    Err(VersionConflict::standard_message(
        first_expected.unwrap_or_else(|| RawVersion::from_hash(if_match.trim())),
        current.clone(),
    ))
}

/// Details about a failed precondition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionConflict {
    /// The version the client asserted
    pub expected: RawVersion,

    /// The version currently stored
    pub current: RawVersion,

    pub message: String,
}

impl VersionConflict {
    pub fn new<E, C>(expected: E, current: C, message: impl Into<String>) -> Self
    where
        E: Into<RawVersion>,
        C: Into<RawVersion>,
    {
        Self {
            expected: expected.into(),
            current: current.into(),
            message: message.into(),
        }
    }

    pub fn standard_message<E, C>(expected: E, current: C) -> Self
    where
        E: Into<RawVersion>,
        C: Into<RawVersion>,
    {
        Self::new(
            expected,
            current,
            "Resource was modified by another client. Please refresh and try again.",
        )
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version conflict: expected '{}', found '{}'. {}",
            self.expected, self.current, self.message
        )
    }
}

impl std::error::Error for VersionConflict {}

/// Errors that can occur while parsing versions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VersionError {
    #[error("Invalid ETag format: {0}")]
    InvalidEtagFormat(String),

    #[error("Failed to parse version: {0}")]
    ParseError(String),
}
