use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::segment::Conversation;

/// Free practice set shipped with the binary: (id, officer, driver)
const BUILTIN: &[(u32, &str, &str)] = &[
    (
        1,
        "What are you hauling?",
        "I'm hauling refrigerated meat products for a grocery chain.",
    ),
    (
        2,
        "How far are you from your delivery location?",
        "I'm about 120 miles away from my drop-off point.",
    ),
    (
        3,
        "Are your load straps secure?",
        "Yes, I double-checked all straps before leaving the warehouse.",
    ),
    (
        4,
        "When did you last take a break?",
        "About 30 minutes ago, I stopped at a rest area for lunch.",
    ),
    (
        5,
        "Are you hauling perishable goods?",
        "Yes, I'm transporting frozen vegetables in a reefer trailer.",
    ),
    (
        6,
        "What company are you driving for?",
        "I'm with American Freight Logistics, based in Chicago.",
    ),
    (
        7,
        "Are you aware of any violations on your record?",
        "No, my record is clean for the past two years.",
    ),
    (
        8,
        "Are you using a paper log or an ELD?",
        "I'm using an Electronic Logging Device to track my hours.",
    ),
    (
        9,
        "Have you had any alcohol in the last 24 hours?",
        "No, officer. I haven't consumed any alcohol.",
    ),
    (
        10,
        "Is your horn and lighting system working properly?",
        "Yes, I tested them during my pre-trip inspection.",
    ),
];

/// Conversations keyed by question id
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    conversations: BTreeMap<u32, Conversation>,
}

impl Catalog {
    pub fn new(conversations: impl IntoIterator<Item = Conversation>) -> Self {
        Self {
            conversations: conversations.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// The ten free questions
    pub fn builtin() -> Self {
        Self::new(BUILTIN.iter().map(|&(id, officer, driver)| Conversation {
            id,
            officer: officer.to_string(),
            driver: driver.to_string(),
            is_free: true,
        }))
    }

    /// Load a catalog from a JSON array of `{id, officer, driver, isFree}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let conversations: Vec<Conversation> =
            serde_json::from_str(&data).context("Failed to parse catalog JSON")?;

        info!(
            "Loaded {} conversations from {}",
            conversations.len(),
            path.display()
        );

        Ok(Self::new(conversations))
    }

    pub fn get(&self, id: u32) -> Option<&Conversation> {
        self.conversations.get(&id)
    }

    /// Conversations in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.values()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.conversations.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    #[test]
    fn test_builtin_catalog_is_free_and_ordered() {
        let catalog = Catalog::builtin();

        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.ids(), (1..=10).collect::<Vec<_>>());
        assert!(catalog.iter().all(|c| c.is_free));
    }

    #[test]
    fn test_segments_officer_first() {
        let catalog = Catalog::builtin();
        let conversation = catalog.get(5).unwrap();

        let [officer, driver] = conversation.segments();
        assert_eq!(officer.role, Role::Officer);
        assert_eq!(officer.text, "Are you hauling perishable goods?");
        assert_eq!(driver.role, Role::Driver);
        assert_eq!(driver.question_id, 5);
    }

    #[test]
    fn test_missing_id() {
        assert!(Catalog::builtin().get(999).is_none());
    }
}
