//! Card record types for the flashcard store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single front/back flashcard extracted from a study document.
///
/// Immutable once written to the store; `id` is assigned at insertion
/// time and stays 0 until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeCard {
    /// Store-assigned identifier (0 until inserted)
    #[serde(default)]
    pub id: u64,
    /// Display title, usually the keyword
    pub title: String,
    /// Full card text, usually the explanation
    pub content: String,
    /// Subject tag the model assigned to the source document
    #[serde(default)]
    pub file_tag: String,
    /// Section heading the card was extracted under
    #[serde(default)]
    pub section: String,
    /// Item number within the document
    #[serde(default)]
    pub item_id: String,
    /// Front face of the card
    #[serde(default)]
    pub keyword: String,
    /// Back face of the card
    #[serde(default)]
    pub explanation: String,
    /// Name of the document the card came from
    #[serde(default)]
    pub source_file: String,
    /// When the card was produced
    pub processed_time: DateTime<Utc>,
}

impl KnowledgeCard {
    /// Create a new unstored card. Title and content mirror the
    /// keyword/explanation pair.
    pub fn new(
        keyword: impl Into<String>,
        explanation: impl Into<String>,
        file_tag: impl Into<String>,
        section: impl Into<String>,
        item_id: impl Into<String>,
        source_file: impl Into<String>,
    ) -> Self {
        let keyword = keyword.into();
        let explanation = explanation.into();
        Self {
            id: 0,
            title: keyword.clone(),
            content: explanation.clone(),
            file_tag: file_tag.into(),
            section: section.into(),
            item_id: item_id.into(),
            keyword,
            explanation,
            source_file: source_file.into(),
            processed_time: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_mirrors_faces() {
        let card = KnowledgeCard::new(
            "osmosis",
            "Movement of water across a membrane toward higher solute concentration.",
            "biology",
            "Section 1",
            "1",
            "bio_notes.txt",
        );

        assert_eq!(card.id, 0);
        assert_eq!(card.title, "osmosis");
        assert_eq!(card.content, card.explanation);
        assert_eq!(card.keyword, "osmosis");
        assert_eq!(card.source_file, "bio_notes.txt");
    }
}
