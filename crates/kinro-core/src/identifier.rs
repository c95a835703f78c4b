//! Identifiers issued by the backend.
//!
//! The reference backend hands out UUID strings, other deployments use
//! integer keys. Both shapes deserialize into the same [`Id`], which compares
//! and hashes by its canonical string form and always serializes as a string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable identifier of a backend entity.
///
/// # Examples
///
/// ```
/// use kinro_core::identifier::Id;
///
/// let numeric = Id::from(7u64);
/// let textual = Id::new("7");
/// assert_eq!(numeric, textual);
///
/// let from_json: Id = serde_json::from_str("7").unwrap();
/// assert_eq!(from_json, numeric);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "WireId", into = "String")]
pub struct Id(String);

impl Id {
    /// Creates an `Id` from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the canonical string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Accepted wire shapes of an identifier.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl From<WireId> for Id {
    fn from(wire: WireId) -> Self {
        match wire {
            WireId::Text(text) => Self(text),
            WireId::Unsigned(number) => Self(number.to_string()),
            WireId::Signed(number) => Self(number.to_string()),
        }
    }
}
