use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicHistoryEntry {
    pub topic: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSelection {
    pub topic: String,
    pub category: String,
    pub method: SelectionMethod,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionMethod {
    AiGenerated,
    TemplateGenerated,
    Fallback,
}

impl Display for SelectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let method = match self {
            SelectionMethod::AiGenerated => "ai_generated",
            SelectionMethod::TemplateGenerated => "template_generated",
            SelectionMethod::Fallback => "fallback",
        };
        write!(f, "{}", method)
    }
}

/// Prepends an entry to the history log: duplicates of the same topic are
/// dropped, newest entries come first, the log is capped at `max_entries`.
pub fn prepend_topic(
    entries: &mut Vec<TopicHistoryEntry>,
    entry: TopicHistoryEntry,
    max_entries: usize,
) {
    entries.retain(|existing| existing.topic != entry.topic);
    entries.insert(0, entry);
    entries.truncate(max_entries);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(topic: &str) -> TopicHistoryEntry {
        TopicHistoryEntry {
            topic: topic.to_string(),
            category: "Culture & Traditions".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn prepend_puts_newest_first() {
        let mut entries = vec![entry("a"), entry("b")];
        prepend_topic(&mut entries, entry("c"), 30);
        assert_eq!(entries[0].topic, "c");
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn prepend_deduplicates_by_topic() {
        let mut entries = vec![entry("a"), entry("b")];
        prepend_topic(&mut entries, entry("b"), 30);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].topic, "b");
        assert_eq!(entries[1].topic, "a");
    }

    #[test]
    fn prepend_caps_history_length() {
        let mut entries = (0..30).map(|i| entry(&format!("t{}", i))).collect::<Vec<_>>();
        prepend_topic(&mut entries, entry("fresh"), 30);
        assert_eq!(entries.len(), 30);
        assert_eq!(entries[0].topic, "fresh");
        assert!(entries.iter().all(|e| e.topic != "t29"));
    }
}
