//! Flashcard persistence: card records and the JSON-backed store.

mod persistence;
mod types;

pub use persistence::CardStore;
pub use types::KnowledgeCard;
