//! Identity keys.

use crate::error::{IdentityError, IdentityResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// The natural key of a banned identity.
///
/// Host environments hand out either numeric account ids (64-bit platform
/// ids) or free-form textual ids. Parsing picks the numeric form whenever the
/// input is made only of ASCII digits and fits in a `u64`.
///
/// # Equality
///
/// - Numeric ids compare by value, so `"007"` and `7` are the same identity.
/// - Textual ids compare ignoring ASCII case.
/// - A `Text` holding only digits that fit in a `u64` is the numeric id of
///   that value, so `Text("0042")` equals `Numeric(42)`.
/// - Any other numeric id never equals a textual id.
///
/// Prefer [`IdentityId::parse`] over building `Text` directly; it yields the
/// form the stores hand back.
///
/// `Hash` and `Ord` agree with this equality, so ids can key both hash and
/// tree maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawId", into = "String")]
pub enum IdentityId {
    /// A numeric platform id.
    Numeric(u64),
    /// A textual id, kept as supplied.
    Text(String),
}

impl IdentityId {
    /// Parses an identity id from its textual form.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Empty`] for empty input.
    pub fn parse(input: &str) -> IdentityResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }

        Ok(match numeric_text(trimmed) {
            Some(value) => IdentityId::Numeric(value),
            None => IdentityId::Text(trimmed.to_string()),
        })
    }

    /// Returns the numeric value, if this id is numeric or digit-only text.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self.key() {
            Key::Numeric(value) => Some(value),
            Key::Text(_) => None,
        }
    }

    /// Returns true if this id compares as a numeric id.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.as_u64().is_some()
    }

    /// Returns the id in the form [`IdentityId::parse`] would produce.
    #[must_use]
    pub fn canonical(&self) -> IdentityId {
        match self.key() {
            Key::Numeric(value) => IdentityId::Numeric(value),
            Key::Text(_) => self.clone(),
        }
    }

    fn key(&self) -> Key<'_> {
        match self {
            IdentityId::Numeric(value) => Key::Numeric(*value),
            IdentityId::Text(text) => match numeric_text(text) {
                Some(value) => Key::Numeric(value),
                None => Key::Text(text),
            },
        }
    }
}

/// What equality, hashing, and ordering look at.
#[derive(Clone, Copy)]
enum Key<'a> {
    Numeric(u64),
    Text(&'a str),
}

impl Key<'_> {
    fn rank(self) -> u8 {
        match self {
            Key::Numeric(_) => 0,
            Key::Text(_) => 1,
        }
    }
}

fn numeric_text(text: &str) -> Option<u64> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

impl PartialEq for IdentityId {
    fn eq(&self, other: &Self) -> bool {
        match (self.key(), other.key()) {
            (Key::Numeric(a), Key::Numeric(b)) => a == b,
            (Key::Text(a), Key::Text(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl Eq for IdentityId {}

impl Hash for IdentityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let key = self.key();
        key.rank().hash(state);
        match key {
            Key::Numeric(value) => value.hash(state),
            Key::Text(text) => {
                for byte in text.bytes() {
                    state.write_u8(byte.to_ascii_lowercase());
                }
                state.write_u8(0xFF);
            }
        }
    }
}

impl Ord for IdentityId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.key(), other.key()) {
            (Key::Numeric(a), Key::Numeric(b)) => a.cmp(&b),
            (Key::Text(a), Key::Text(b)) => a
                .bytes()
                .map(|b| b.to_ascii_lowercase())
                .cmp(b.bytes().map(|b| b.to_ascii_lowercase())),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for IdentityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityId::Numeric(value) => write!(f, "{value}"),
            IdentityId::Text(text) => f.write_str(text),
        }
    }
}

impl FromStr for IdentityId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for IdentityId {
    fn from(value: u64) -> Self {
        IdentityId::Numeric(value)
    }
}

impl From<IdentityId> for String {
    fn from(id: IdentityId) -> Self {
        id.to_string()
    }
}

/// Wire form accepted when deserializing: a JSON number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawId> for IdentityId {
    type Error = IdentityError;

    fn try_from(raw: RawId) -> Result<Self, Self::Error> {
        match raw {
            RawId::Number(value) => Ok(IdentityId::Numeric(value)),
            RawId::Text(text) => IdentityId::parse(&text),
        }
    }
}
