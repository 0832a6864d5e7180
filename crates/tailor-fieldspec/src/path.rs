//! Field paths for addressing fields within resources
//!
//! Provides [`FieldPath`], the slash-separated selector a field spec uses to
//! reach a field, possibly through sequences.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One segment of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Every element of a sequence
    Each,
}

/// Path within a resource's content tree
///
/// Segments are separated by `/`; a literal `/` inside a key is written
/// `\/`. A segment `[]` or `*`, or a `[]` suffix on a key, visits every
/// element of a sequence. A key that lands on a sequence is applied to each
/// element as well, so the marker is optional.
///
/// # Examples
/// - `metadata/name`
/// - `spec/template/spec/containers/name`
/// - `spec/containers[]/env/valueFrom/secretKeyRef/name`
/// - `metadata/annotations/app.kubernetes.io\/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// Create path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Path made only of keys
    #[must_use]
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| PathSegment::Key(k.into())).collect())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a key, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(PathSegment::Key(key.into()));
        new
    }

    /// Concatenate two paths
    #[inline]
    #[must_use]
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut new = self.clone();
        new.0.extend(other.0.iter().cloned());
        new
    }

    /// Check if the path is exactly the given keys
    #[must_use]
    pub fn is_keys(&self, keys: &[&str]) -> bool {
        self.0.len() == keys.len()
            && self
                .0
                .iter()
                .zip(keys)
                .all(|(seg, key)| matches!(seg, PathSegment::Key(k) if k == key))
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            match seg {
                PathSegment::Key(k) => {
                    if !first {
                        f.write_str("/")?;
                    }
                    f.write_str(&k.replace('/', "\\/"))?;
                }
                PathSegment::Each => f.write_str("[]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        for (position, raw) in split_unescaped(s)?.into_iter().enumerate() {
            match raw.as_str() {
                "" => return Err(PathError::EmptySegment { position }),
                "[]" | "*" => segments.push(PathSegment::Each),
                _ => {
                    if let Some(key) = raw.strip_suffix("[]") {
                        if key.contains("[]") {
                            return Err(PathError::InvalidSegment(raw));
                        }
                        segments.push(PathSegment::Key(key.to_string()));
                        segments.push(PathSegment::Each);
                    } else if raw.contains("[]") {
                        return Err(PathError::InvalidSegment(raw));
                    } else {
                        segments.push(PathSegment::Key(raw));
                    }
                }
            }
        }

        Ok(Self(segments))
    }
}

/// Split on unescaped `/`, resolving `\/` and `\\`
fn split_unescaped(s: &str) -> Result<Vec<String>, PathError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('/' | '\\')) => current.push(escaped),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => return Err(PathError::DanglingEscape),
            },
            '/' => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    parts.push(current);
    Ok(parts)
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to field paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty path
    #[error("field path is empty")]
    Empty,

    /// Empty segment in path
    #[error("field path contains empty segment at position {position}")]
    EmptySegment { position: usize },

    /// List marker in the middle of a segment
    #[error("invalid segment: {0} ('[]' may only end a segment)")]
    InvalidSegment(String),

    /// Trailing backslash
    #[error("field path ends with a dangling escape")]
    DanglingEscape,
}
