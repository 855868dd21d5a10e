//! Identifiers for scheduler entities.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity of an [`Animator`](crate::Animator) within a scheduler registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AnimatorId(pub Uuid);

impl AnimatorId {
    /// Generate a fresh random id.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AnimatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnimatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = AnimatorId::new();
        let b = AnimatorId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 32);
    }
}
