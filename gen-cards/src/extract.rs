//! Turning chat completions into knowledge cards.
//!
//! The prompts ask for a structured JSON payload; models wrap it in code
//! fences or prose often enough that extraction has to dig the JSON out,
//! and fall back to line splitting when there is none.

use serde::Deserialize;
use serde_json::Value;

use crate::store::KnowledgeCard;

const DEFAULT_FILE_TAG: &str = "study notes";
const FALLBACK_FILE_TAG: &str = "ai extracted";

// Payload shape the prompts request

#[derive(Debug, Deserialize)]
struct CompletionPayload {
    #[serde(default)]
    file_tag: Option<String>,
    #[serde(default)]
    sections: Vec<SectionPayload>,
}

#[derive(Debug, Deserialize)]
struct SectionPayload {
    #[serde(default)]
    section_title: Option<String>,
    #[serde(default)]
    items: Vec<ItemPayload>,
}

#[derive(Debug, Deserialize)]
struct ItemPayload {
    #[serde(default)]
    item_id: Option<Value>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Parse a completion into cards.
///
/// Tries the structured payload first; anything unparseable or empty
/// drops to the line-splitting fallback. An empty result is legal, the
/// caller decides what an empty chunk means.
pub fn cards_from_completion(completion: &str, file_name: &str) -> Vec<KnowledgeCard> {
    if let Some(json) = extract_json_block(completion) {
        if let Ok(payload) = serde_json::from_str::<CompletionPayload>(json) {
            let cards = cards_from_payload(&payload, file_name);
            if !cards.is_empty() {
                return cards;
            }
        }
    }

    log::debug!("structured payload missing or empty, using line fallback");
    fallback_cards(completion, file_name)
}

/// Locate the JSON object inside a completion, tolerating code fences
/// and surrounding prose.
fn extract_json_block(completion: &str) -> Option<&str> {
    let trimmed = completion.trim();

    // Prefer the body of a ```json fence when present
    if let Some(fence_start) = trimmed.find("```") {
        let after = &trimmed[fence_start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        if let Some(fence_end) = after[body_start..].find("```") {
            let body = after[body_start..body_start + fence_end].trim();
            if body.starts_with('{') {
                return Some(body);
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

fn cards_from_payload(payload: &CompletionPayload, file_name: &str) -> Vec<KnowledgeCard> {
    let file_tag = payload
        .file_tag
        .clone()
        .unwrap_or_else(|| DEFAULT_FILE_TAG.to_string());

    let mut cards = Vec::new();
    for (section_index, section) in payload.sections.iter().enumerate() {
        let section_title = section
            .section_title
            .clone()
            .unwrap_or_else(|| format!("Section {}", section_index + 1));

        for (item_index, item) in section.items.iter().enumerate() {
            let keyword = item.keyword.clone().unwrap_or_default();
            let explanation = item.explanation.clone().unwrap_or_default();
            let item_id = item
                .item_id
                .as_ref()
                .and_then(item_id_text)
                .unwrap_or_else(|| format!("{}-{}", section_index + 1, item_index + 1));

            cards.push(KnowledgeCard::new(
                keyword,
                explanation,
                file_tag.clone(),
                section_title.clone(),
                item_id,
                file_name,
            ));
        }
    }
    cards
}

/// Models emit item ids as strings or bare numbers; accept both.
fn item_id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Line-splitting fallback for free-text completions: every sentence or
/// line longer than 10 characters becomes a card.
fn fallback_cards(content: &str, file_name: &str) -> Vec<KnowledgeCard> {
    content
        .split(['\n', '.', '。'])
        .map(str::trim)
        .filter(|line| line.chars().count() > 10)
        .enumerate()
        .map(|(index, line)| {
            KnowledgeCard::new(
                extract_keyword(line),
                line,
                FALLBACK_FILE_TAG,
                format!("Section {}", index / 5 + 1),
                (index + 1).to_string(),
                file_name,
            )
        })
        .collect()
}

/// Crude keyword heuristic: first word of 2 to 6 characters, else a
/// truncated prefix of the line.
fn extract_keyword(text: &str) -> String {
    let keyword = text
        .split([' ', '、', '，'])
        .find(|word| (2..=6).contains(&word.chars().count()));

    match keyword {
        Some(word) => word.to_string(),
        None => {
            let prefix: String = text.chars().take(15).collect();
            if text.chars().count() > 15 {
                format!("{}...", prefix)
            } else {
                prefix
            }
        }
    }
}
