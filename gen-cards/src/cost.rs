//! Token estimation, request cost preview, and request pacing.

use std::sync::Mutex;
use tokio::time::{Duration, Instant, sleep};

/// Rough token estimate from weighted character counts: CJK ideographs
/// run about 1.5 tokens each, everything else about 0.25.
pub fn estimate_tokens(text: &str) -> usize {
    let cjk_chars = text
        .chars()
        .filter(|c| ('\u{4e00}'..='\u{9fff}').contains(c))
        .count();
    let other_chars = text.chars().count() - cjk_chars;

    (cjk_chars as f64 * 1.5 + other_chars as f64 * 0.25) as usize
}

/// Dollar cost estimate for a token count against a model's per-token
/// price.
pub fn estimate_cost(tokens: usize, model: &str) -> f64 {
    let cost_per_token = match model {
        "deepseek-chat" => 0.000_000_27,
        "gpt-4" => 0.000_03,
        _ => 0.000_002,
    };
    tokens as f64 * cost_per_token
}

/// Sliding-window request pacer: at most `requests_per_minute` calls in
/// any 60-second window, waiting cooperatively when the window is full.
pub struct RateLimiter {
    requests_per_minute: usize,
    timestamps: Mutex<Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: usize) -> Self {
        Self {
            requests_per_minute: requests_per_minute.max(1),
            timestamps: Mutex::new(Vec::new()),
        }
    }

    /// Wait until a request slot is free, then claim it.
    pub async fn acquire(&self) {
        loop {
            {
                let mut timestamps = self.timestamps.lock().unwrap();
                let now = Instant::now();
                timestamps.retain(|t| now.duration_since(*t) < Duration::from_secs(60));

                if timestamps.len() < self.requests_per_minute {
                    timestamps.push(Instant::now());
                    return;
                }
            }
            sleep(Duration::from_secs(1)).await;
        }
    }
}
