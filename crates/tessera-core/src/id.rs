//! Stable entity identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable entity identifier handed out by a scene world.
///
/// Animation bindings hold these instead of references, so a despawned
/// target simply stops resolving rather than dangling.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create an EntityId from a raw value (for deserialization/testing)
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// The id following this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        let id = EntityId::from_raw(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.next().raw(), 43);
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        assert!(EntityId::from_raw(3) < EntityId::from_raw(10));
        assert_eq!(format!("{:?}", EntityId::from_raw(7)), "EntityId(7)");
    }
}
