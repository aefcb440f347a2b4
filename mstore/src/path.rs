//! Validated slash-separated document paths.
//!
//! ```rust
//! use mstore::DocumentPath;
//!
//! let path = DocumentPath::parse("users/uid-1").unwrap();
//! let credits = path.child("credits").unwrap();
//!
//! assert_eq!(credits.as_str(), "users/uid-1/credits");
//! assert!(path.contains(&credits));
//! assert!(DocumentPath::parse("coupons/BAD.CODE").is_err());
//! ```

use std::fmt::{Display, Formatter};

use crate::StoreError;

const FORBIDDEN: [char; 6] = ['.', '#', '$', '[', ']', '/'];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::invalid_path("path must have at least one segment"));
        }

        let segments = trimmed
            .split('/')
            .map(validate_segment)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = segments
            .into_iter()
            .map(|segment| validate_segment(segment.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if segments.is_empty() {
            return Err(StoreError::invalid_path("path must have at least one segment"));
        }

        Ok(Self { segments })
    }

    pub fn child(&self, segment: impl AsRef<str>) -> Result<Self, StoreError> {
        let mut segments = self.segments.clone();
        segments.push(validate_segment(segment.as_ref())?);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn last_segment(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }

        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// True when `other` equals this path or lies beneath it.
    pub fn contains(&self, other: &DocumentPath) -> bool {
        other.segments.len() >= self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// True when one path contains the other.
    pub fn overlaps(&self, other: &DocumentPath) -> bool {
        self.contains(other) || other.contains(self)
    }

    pub fn as_str(&self) -> String {
        self.segments.join("/")
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str())
    }
}

fn validate_segment(segment: &str) -> Result<String, StoreError> {
    if segment.is_empty() {
        return Err(StoreError::invalid_path("path segments must not be empty"));
    }

    if let Some(bad) = segment.chars().find(|c| FORBIDDEN.contains(c) || c.is_control()) {
        return Err(StoreError::invalid_path(format!(
            "path segment '{segment}' contains forbidden character '{bad}'"
        )));
    }

    Ok(segment.to_string())
}
