//! Identifier types for book entities
//!
//! Order and event ids are assigned by the order store at creation and are
//! monotonically increasing, so they double as arrival-order tie-breakers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a pair symbol.
pub const MAX_PAIR_LEN: usize = 25;

/// Store-assigned order identifier (64-bit monotonic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned history event identifier (32-bit monotonic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i32);

impl EventId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier, referencing the accounts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i32);

impl AccountId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trading pair symbol (opaque, at most 25 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairId(String);

impl PairId {
    /// Create a new PairId.
    ///
    /// # Panics
    /// Panics if the symbol is empty or longer than [`MAX_PAIR_LEN`].
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::try_new(symbol).expect("pair symbol must be 1..=25 characters")
    }

    /// Try to create a PairId, returning None if the symbol is invalid.
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.is_empty() || s.len() > MAX_PAIR_LEN {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for PairId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PairId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::try_new(s).ok_or_else(|| {
            serde::de::Error::custom(crate::errors::InvalidRequest::Pair(
                "symbol must be 1..=25 characters".to_string(),
            ))
        })
    }
}
