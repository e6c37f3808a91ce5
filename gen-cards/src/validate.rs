//! Quality rules, scoring, and deduplication for extracted cards.

use std::collections::HashSet;

use crate::store::KnowledgeCard;

const MAX_KEYWORD_CHARS: usize = 50;
const MIN_EXPLANATION_CHARS: usize = 10;
const MAX_EXPLANATION_CHARS: usize = 500;

/// How many explanation characters participate in the dedup key.
const DEDUP_PREFIX_CHARS: usize = 50;

/// Outcome of one validation pass. Valid cards keep their input order;
/// every rejected card carries the reasons it failed.
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: Vec<KnowledgeCard>,
    pub invalid: Vec<RejectedCard>,
}

#[derive(Debug)]
pub struct RejectedCard {
    pub card: KnowledgeCard,
    pub reasons: Vec<String>,
}

/// Check every card against the quality rules. A card with any violation
/// moves to the rejected list with all of its reasons.
pub fn validate_cards(cards: Vec<KnowledgeCard>) -> ValidationResult {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for card in cards {
        let reasons = card_issues(&card);
        if reasons.is_empty() {
            valid.push(card);
        } else {
            invalid.push(RejectedCard { card, reasons });
        }
    }

    ValidationResult { valid, invalid }
}

fn card_issues(card: &KnowledgeCard) -> Vec<String> {
    let mut issues = Vec::new();
    let keyword_len = card.keyword.chars().count();
    let explanation_len = card.explanation.chars().count();

    if card.keyword.trim().is_empty() {
        issues.push("keyword is empty".to_string());
    }
    if keyword_len > MAX_KEYWORD_CHARS {
        issues.push("keyword too long".to_string());
    }
    if explanation_len < MIN_EXPLANATION_CHARS {
        issues.push("explanation too short".to_string());
    }
    if explanation_len > MAX_EXPLANATION_CHARS {
        issues.push("explanation too long".to_string());
    }
    if card.keyword == card.explanation {
        issues.push("keyword repeats the explanation".to_string());
    }

    issues
}

/// Mean per-card quality over a 0.0 to 1.0 scale; an empty slice scores
/// 0.0.
pub fn quality_score(cards: &[KnowledgeCard]) -> f64 {
    if cards.is_empty() {
        return 0.0;
    }

    let total: f64 = cards.iter().map(card_score).sum();
    total / cards.len() as f64
}

/// Score one card out of 100 points, then scale down.
///
/// Keyword-length band: 40 for 2-5 chars, 30 for 6-10, 20 otherwise.
/// Explanation-length band: 40 for 50-200, 30 for 30-49 or 201-300,
/// 20 otherwise. Uniqueness: 20 when the keyword differs from the
/// explanation's first 20 characters, else 10.
fn card_score(card: &KnowledgeCard) -> f64 {
    let mut score = 0.0;
    let keyword_len = card.keyword.chars().count();
    let explanation_len = card.explanation.chars().count();

    score += match keyword_len {
        2..=5 => 40.0,
        6..=10 => 30.0,
        _ => 20.0,
    };

    score += match explanation_len {
        50..=200 => 40.0,
        30..=49 | 201..=300 => 30.0,
        _ => 20.0,
    };

    let explanation_prefix: String = card.explanation.chars().take(20).collect();
    score += if card.keyword != explanation_prefix {
        20.0
    } else {
        10.0
    };

    score / 100.0
}

/// Drop later duplicates, keyed by the keyword plus the first 50
/// characters of the explanation. First occurrence wins, order is
/// preserved.
pub fn deduplicate_cards(cards: Vec<KnowledgeCard>) -> Vec<KnowledgeCard> {
    let mut seen = HashSet::new();
    cards
        .into_iter()
        .filter(|card| {
            let prefix: String = card.explanation.chars().take(DEDUP_PREFIX_CHARS).collect();
            seen.insert(format!("{}-{}", card.keyword, prefix))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(keyword: &str, explanation: &str) -> KnowledgeCard {
        KnowledgeCard::new(keyword, explanation, "tag", "Section 1", "1", "notes.txt")
    }

    #[test]
    fn rejects_short_explanation() {
        let result = validate_cards(vec![card("keyword", "x")]);

        assert!(result.valid.is_empty());
        assert_eq!(result.invalid.len(), 1);
        assert!(
            result.invalid[0]
                .reasons
                .contains(&"explanation too short".to_string())
        );
    }

    #[test]
    fn accepts_mid_band_keyword() {
        let explanation = "Process by which green plants use sunlight to synthesize food \
                           from carbon dioxide and water inside chloroplasts today";
        assert!(explanation.chars().count() >= 100);

        let result = validate_cards(vec![card("photosynthesis", explanation)]);

        assert_eq!(result.valid.len(), 1);
        assert!(result.invalid.is_empty());
    }

    #[test]
    fn test_rejects_empty_keyword() {
        let result = validate_cards(vec![card("  ", "a perfectly fine explanation")]);
        assert_eq!(result.invalid.len(), 1);
        assert!(
            result.invalid[0]
                .reasons
                .contains(&"keyword is empty".to_string())
        );
    }

    #[test]
    fn test_rejects_identical_faces() {
        let text = "some text that is long enough";
        let result = validate_cards(vec![card(text, text)]);
        assert_eq!(result.invalid.len(), 1);
        assert!(
            result.invalid[0]
                .reasons
                .contains(&"keyword repeats the explanation".to_string())
        );
    }

    #[test]
    fn test_collects_multiple_reasons() {
        let result = validate_cards(vec![card(&"k".repeat(60), "short")]);
        assert_eq!(result.invalid[0].reasons.len(), 2);
    }

    #[test]
    fn empty_slice_scores_zero() {
        assert_eq!(quality_score(&[]), 0.0);
    }

    #[test]
    fn ideal_card_scores_one() {
        // Keyword length 3, explanation length 100, distinct prefix
        let explanation = "e".repeat(100);
        let cards = vec![card("dna", &explanation)];

        assert!((quality_score(&cards) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_band_edges() {
        // Length 6 keyword drops to the middle band
        let cards = vec![card("abcdef", &"e".repeat(100))];
        assert!((quality_score(&cards) - 0.9).abs() < 1e-9);

        // Explanation of 30 chars lands in the middle band
        let cards = vec![card("dna", &"e".repeat(30))];
        assert!((quality_score(&cards) - 0.9).abs() < 1e-9);

        // Sharing only the first 3 chars keeps the full uniqueness bonus
        let explanation = format!("abc{}", "e".repeat(97));
        let cards = vec![card(&explanation[..3], &explanation)];
        assert!((quality_score(&cards) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_prefix_match_halves_bonus() {
        // 20-char keyword identical to the explanation's first 20 chars
        let keyword = "k".repeat(20);
        let explanation = format!("{}{}", keyword, "e".repeat(80));
        let cards = vec![card(&keyword, &explanation)];

        // 20 (keyword band) + 40 (explanation band) + 10 (prefix match)
        assert!((quality_score(&cards) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_dedup_first_wins_and_keeps_order() {
        let cards = vec![
            card("alpha", "first explanation of alpha concept"),
            card("beta", "an explanation of beta"),
            card("alpha", "first explanation of alpha concept"),
            card("gamma", "an explanation of gamma"),
        ];

        let deduped = deduplicate_cards(cards);

        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].keyword, "alpha");
        assert_eq!(deduped[1].keyword, "beta");
        assert_eq!(deduped[2].keyword, "gamma");
    }

    #[test]
    fn test_dedup_keys_on_explanation_prefix() {
        let shared_prefix = "p".repeat(50);
        let cards = vec![
            card("alpha", &format!("{}one", shared_prefix)),
            card("alpha", &format!("{}two", shared_prefix)),
        ];

        // Same keyword and same first 50 chars counts as a duplicate
        assert_eq!(deduplicate_cards(cards).len(), 1);
    }

    #[test]
    fn deduplicate_is_idempotent() {
        let cards = vec![
            card("alpha", "first explanation of alpha concept"),
            card("alpha", "first explanation of alpha concept"),
            card("beta", "an explanation of beta"),
        ];

        let once = deduplicate_cards(cards);
        let twice = deduplicate_cards(once.clone());

        assert_eq!(once, twice);
    }
}
