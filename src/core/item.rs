use crate::core::transcript::sanitize_video_id;
use crate::error::Result;
use derive_more::{AsRef, Display};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opaque identifier of one discovered video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, AsRef, Serialize, Deserialize)]
#[as_ref(forward)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn parse(raw: &str) -> Result<Self> {
        sanitize_video_id(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Transcripts keyed by item, in discovery order.
///
/// Only items whose retrieval produced non-empty text are ever inserted; a
/// skipped item is absent rather than present with a placeholder.
#[derive(Debug, Default, Clone)]
pub struct TranscriptSet {
    entries: IndexMap<ItemId, String>,
}

impl TranscriptSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transcript. Returns `false` and leaves the set untouched when
    /// the item is already present or the text is blank.
    pub fn insert(&mut self, id: ItemId, text: String) -> bool {
        if text.trim().is_empty() || self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, text);
        true
    }

    #[cfg(test)]
    pub fn get(&self, id: &ItemId) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &str)> {
        self.entries.iter().map(|(id, text)| (id, text.as_str()))
    }

    #[cfg(test)]
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ItemId {
        ItemId::parse(raw).expect("valid id")
    }

    #[test]
    fn rejects_unsafe_ids() {
        assert!(ItemId::parse("../etc/passwd").is_err());
        assert!(ItemId::parse("").is_err());
    }

    #[test]
    fn keeps_insertion_order() {
        let mut set = TranscriptSet::new();
        set.insert(id("ccc"), "third listed first".into());
        set.insert(id("aaa"), "then this".into());
        set.insert(id("bbb"), "and this".into());

        let order: Vec<&str> = set.ids().map(ItemId::as_str).collect();
        assert_eq!(order, ["ccc", "aaa", "bbb"]);
    }

    #[test]
    fn blank_and_duplicate_entries_are_refused() {
        let mut set = TranscriptSet::new();
        assert!(set.insert(id("aaa"), "first".into()));
        assert!(!set.insert(id("aaa"), "second".into()));
        assert!(!set.insert(id("bbb"), "   ".into()));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&id("aaa")), Some("first"));
        assert!(!set.contains(&id("bbb")));
    }
}
