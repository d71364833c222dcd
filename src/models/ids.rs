//! Identifiers: deterministic match IDs and Riot ID player keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A deterministic entity ID derived from content hash.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from a hash string.
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Generate an EntityId from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let result = hasher.finalize();
        let hash = hex::encode(result);
        Self(hash[..16].to_string())
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

/// Type alias for match IDs
pub type MatchId = EntityId;

/// Canonical player key in `name#tag` form (a Riot ID).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Compose a Riot ID from the legacy name and tag columns.
    pub fn from_name_tag(name: &str, tag: &str) -> Self {
        let name = name.trim();
        let tag = tag.trim().trim_start_matches('#');
        if tag.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}#{}", name, tag))
        }
    }

    /// Display name part (before `#`).
    pub fn name(&self) -> &str {
        self.0.split_once('#').map(|(n, _)| n).unwrap_or(&self.0)
    }

    /// Tag part (after `#`), if any.
    pub fn tag(&self) -> Option<&str> {
        self.0.split_once('#').map(|(_, t)| t)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation_deterministic() {
        let id1 = EntityId::generate(&["2024-03-02", "Ascent", "Alpha", "Bravo"]);
        let id2 = EntityId::generate(&["2024-03-02", "Ascent", "Alpha", "Bravo"]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_entity_id_different_inputs() {
        let id1 = EntityId::generate(&["2024-03-02", "Ascent", "Alpha", "Bravo"]);
        let id2 = EntityId::generate(&["2024-03-02", "Bind", "Alpha", "Bravo"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entity_id_length_and_hex() {
        let id = EntityId::generate(&["test", "input"]);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_entity_id_serialization() {
        let id = EntityId::generate(&["test"]);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_player_id_from_name_tag() {
        let id = PlayerId::from_name_tag(" Ace ", "#NA1");
        assert_eq!(id.as_str(), "Ace#NA1");
        assert_eq!(id.name(), "Ace");
        assert_eq!(id.tag(), Some("NA1"));
    }

    #[test]
    fn test_player_id_without_tag() {
        let id = PlayerId::from_name_tag("Ace", "");
        assert_eq!(id.as_str(), "Ace");
        assert_eq!(id.tag(), None);
    }

    #[test]
    fn test_player_id_ordering() {
        let mut ids = vec![PlayerId::from("zed#1"), PlayerId::from("ace#2")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "ace#2");
    }

    #[test]
    fn test_player_id_serializes_as_string() {
        let json = serde_json::to_string(&PlayerId::from("ace#1")).unwrap();
        assert_eq!(json, "\"ace#1\"");
    }
}
