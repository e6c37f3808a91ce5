//! JSON-file card store under the user data directory.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::types::KnowledgeCard;

/// Append-only flashcard store backed by a single JSON file.
///
/// Ids are assigned at insertion; records are never mutated afterwards.
pub struct CardStore {
    path: PathBuf,
}

impl CardStore {
    /// Open the store at its default location,
    /// `<data dir>/gen-cards/cards.json`.
    pub fn open_default() -> Result<Self> {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join("gen-cards"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        Ok(Self {
            path: data_dir.join("cards.json"),
        })
    }

    /// Open a store at an explicit path.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Insert a batch of cards, assigning sequential ids, and return the
    /// stored records.
    pub fn insert_all(&self, cards: Vec<KnowledgeCard>) -> Result<Vec<KnowledgeCard>> {
        let mut existing = self.load()?;
        let mut next_id = existing.iter().map(|c| c.id).max().unwrap_or(0) + 1;

        let mut stored = Vec::with_capacity(cards.len());
        for mut card in cards {
            card.id = next_id;
            next_id += 1;
            stored.push(card);
        }

        existing.extend(stored.iter().cloned());
        self.save(&existing)?;
        Ok(stored)
    }

    /// All cards extracted from the given source file, in insertion order.
    pub fn cards_for_source(&self, source_file: &str) -> Result<Vec<KnowledgeCard>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|c| c.source_file == source_file)
            .collect())
    }

    /// Every stored card, in insertion order.
    pub fn all_cards(&self) -> Result<Vec<KnowledgeCard>> {
        self.load()
    }

    /// Remove every stored card.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove card store")?;
        }
        Ok(())
    }

    fn load(&self) -> Result<Vec<KnowledgeCard>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context("Failed to parse card store JSON")
    }

    fn save(&self, cards: &[KnowledgeCard]) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, cards).context("Failed to write card store JSON")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn card(keyword: &str, source: &str) -> KnowledgeCard {
        KnowledgeCard::new(
            keyword,
            format!("An explanation of {} that is long enough.", keyword),
            "tag",
            "Section 1",
            "1",
            source,
        )
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let store = CardStore::at(dir.path().join("cards.json"));

        let first = store
            .insert_all(vec![card("alpha", "a.txt"), card("beta", "a.txt")])
            .unwrap();
        assert_eq!(first[0].id, 1);
        assert_eq!(first[1].id, 2);

        let second = store.insert_all(vec![card("gamma", "b.txt")]).unwrap();
        assert_eq!(second[0].id, 3);
    }

    #[test]
    fn test_cards_for_source_filters() {
        let dir = TempDir::new().unwrap();
        let store = CardStore::at(dir.path().join("cards.json"));

        store
            .insert_all(vec![
                card("alpha", "a.txt"),
                card("beta", "b.txt"),
                card("gamma", "a.txt"),
            ])
            .unwrap();

        let from_a = store.cards_for_source("a.txt").unwrap();
        assert_eq!(from_a.len(), 2);
        assert!(from_a.iter().all(|c| c.source_file == "a.txt"));

        assert_eq!(store.all_cards().unwrap().len(), 3);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cards.json");

        CardStore::at(&path)
            .insert_all(vec![card("alpha", "a.txt")])
            .unwrap();

        let reopened = CardStore::at(&path);
        let cards = reopened.all_cards().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].keyword, "alpha");
    }

    #[test]
    fn test_clear_empties_store() {
        let dir = TempDir::new().unwrap();
        let store = CardStore::at(dir.path().join("cards.json"));

        store.insert_all(vec![card("alpha", "a.txt")]).unwrap();
        store.clear().unwrap();

        assert!(store.all_cards().unwrap().is_empty());
    }

    #[test]
    fn test_empty_store_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = CardStore::at(dir.path().join("missing.json"));
        assert!(store.all_cards().unwrap().is_empty());
    }
}
