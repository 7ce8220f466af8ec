//! Opaque string identifiers used by the source tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An entity key as stored in the snapshot tables.
///
/// Keys are opaque: the dataset uses slugs for groups and replay ids for
/// games, so no structure is assumed beyond equality and ordering.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from a raw key.
    pub fn new(key: String) -> Self {
        Self(key)
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for group (event or series) IDs
pub type GroupId = EntityId;

/// Type alias for game (replay) IDs
pub type GameId = EntityId;

/// Type alias for player IDs
pub type PlayerId = EntityId;
