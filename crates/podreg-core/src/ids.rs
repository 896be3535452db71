//! Pod identifiers.
//!
//! Pod IDs are opaque strings. Clients may choose their own; when they don't,
//! the coordinator assigns a random UUID v4 at create time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque, globally unique pod identifier.
///
/// An empty ID means "not yet assigned". Once a pod has been created its ID
/// never changes.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PodId(String);

impl PodId {
    /// Create a `PodId` from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random `PodId` (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns true if no ID has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the raw bytes of the ID, used as the storage key.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PodId({})", self.0)
    }
}

impl fmt::Display for PodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PodId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for PodId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PodId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<PodId> for String {
    fn from(id: PodId) -> Self {
        id.0
    }
}

impl AsRef<str> for PodId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input string is empty.
    #[error("identifier must not be empty")]
    Empty,

    /// The input is not valid UTF-8.
    #[error("identifier is not valid UTF-8")]
    InvalidUtf8,
}

impl TryFrom<&[u8]> for PodId {
    type Error = IdError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let s = std::str::from_utf8(value).map_err(|_| IdError::InvalidUtf8)?;
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = PodId::generate();
        let b = PodId::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn default_is_empty() {
        assert!(PodId::default().is_empty());
        assert!(!PodId::new("web-1").is_empty());
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!("".parse::<PodId>(), Err(IdError::Empty)));
        assert_eq!("web-1".parse::<PodId>().unwrap(), PodId::new("web-1"));
    }

    #[test]
    fn bytes_roundtrip() {
        let id = PodId::new("frontend-7");
        let parsed = PodId::try_from(id.as_bytes()).unwrap();
        assert_eq!(id, parsed);
        assert!(matches!(
            PodId::try_from(&[0xff, 0xfe][..]),
            Err(IdError::InvalidUtf8)
        ));
    }

    #[test]
    fn serde_is_a_plain_string() {
        let id = PodId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let parsed: PodId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(parsed, id);
    }
}
