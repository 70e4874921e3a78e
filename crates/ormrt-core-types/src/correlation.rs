//! Correlation id for bulk calls
//!
//! A `BatchId` names one logical bulk call across all of the physical
//! sub-batches it is split into.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one logical bulk operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(String);

impl BatchId {
    /// Generate a new random id using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(BatchId::new(), BatchId::new());
    }

    #[test]
    fn test_display_matches_as_str() {
        let id = BatchId::new();
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn test_from_string_round_trips_text() {
        let id = BatchId::from_string("batch-1".to_string());
        assert_eq!(id.as_str(), "batch-1");
    }

    #[test]
    fn test_serialization() {
        let id = BatchId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: BatchId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
