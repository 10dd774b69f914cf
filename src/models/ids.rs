//! Identifiers: competitor ids as given by the roster, and content digests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A competitor id exactly as it appears in the roster and match rows.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitorId(String);

impl CompetitorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CompetitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CompetitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompetitorId({})", self.0)
    }
}

impl From<String> for CompetitorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CompetitorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A deterministic digest of a set of loaded records.
///
/// Two loads with identical normalized content share a revision, which lets the
/// refresher tell a real change from a re-poll.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Digest the given fields with SHA256 and keep the first 16 hex characters.
    pub fn generate<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_ref().as_bytes());
        }
        let hash = hex::encode(hasher.finalize());
        Self(hash[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.0)
    }
}
