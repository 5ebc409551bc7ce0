//! Keyword intent classifier: first matching topic in priority order wins.

use crate::knowledge::Topic;

/// Maps free text to a topic. Total: anything unmatched (including blank input) is `Fallback`.
pub fn classify(text: &str) -> Topic {
    let q = text.trim().to_lowercase();
    if q.is_empty() {
        return Topic::Fallback;
    }
    Topic::ROUTABLE
        .into_iter()
        .find(|topic| topic.keywords().iter().any(|kw| q.contains(kw)))
        .unwrap_or(Topic::Fallback)
}
