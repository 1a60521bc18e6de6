//! Rule-based extraction used when no LLM is available or it fails.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize::{truncate_chars, MAX_DERIVED_TITLE_CHARS};
use crate::models::RawItem;

/// Most items the heuristic pass will produce.
pub const MAX_FALLBACK_ITEMS: usize = 10;

/// Captures shorter than this are too vague to be an action item.
const MIN_CAPTURE_CHARS: usize = 11;

static ACTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:action|todo|task|follow[- ]?up|need to|should|must|will)[\s:]+([^\n\r.!?]*)",
        r"(?i)\b(?:assign|delegate)[\s:]+([^\n\r.!?]*)",
        r"(?i)\b(?:deadline|due)[\s:]+([^\n\r.!?]*)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("action pattern is valid"))
    .collect()
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+\d.]+\s+").expect("list marker pattern is valid"));

/// Split free text into raw items.
///
/// Action phrases ("need to", "follow up", "deadline", ...) are tried first,
/// then bullet and numbered list lines. When neither finds anything, the whole
/// text becomes one item.
pub fn heuristic_items(text: &str) -> Vec<RawItem> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut items = phrase_items(text);
    if items.is_empty() {
        items = list_items(text);
    }
    if items.is_empty() {
        return vec![RawItem::titled(text)];
    }

    items.truncate(MAX_FALLBACK_ITEMS);
    items
}

fn phrase_items(text: &str) -> Vec<RawItem> {
    let mut items: Vec<RawItem> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        for pattern in ACTION_PATTERNS.iter() {
            for caps in pattern.captures_iter(line) {
                let Some(capture) = caps.get(1).map(|m| m.as_str().trim()) else {
                    continue;
                };
                if capture.chars().count() < MIN_CAPTURE_CHARS {
                    continue;
                }
                let title = truncate_chars(capture, MAX_DERIVED_TITLE_CHARS);
                if items.iter().any(|i| i.title.as_deref() == Some(title.as_str())) {
                    continue;
                }
                items.push(RawItem {
                    title: Some(title),
                    description: Some(line.to_string()),
                    ..RawItem::default()
                });
            }
        }
    }

    items
}

fn list_items(text: &str) -> Vec<RawItem> {
    text.lines()
        .map(str::trim)
        .filter(|line| LIST_MARKER.is_match(line))
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|content| content.chars().count() >= MIN_CAPTURE_CHARS)
        .map(|content| RawItem {
            title: Some(truncate_chars(&content, MAX_DERIVED_TITLE_CHARS)),
            description: Some(content),
            ..RawItem::default()
        })
        .collect()
}
