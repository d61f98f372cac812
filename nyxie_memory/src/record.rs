//! Persisted per-user record.

use chrono::{DateTime, NaiveDateTime, Utc};
use nyxie_core::{ChatMessage, Role};
use serde::{Deserialize, Deserializer, Serialize};

use crate::accountant::estimate_size;
use crate::language::DEFAULT_LANGUAGE;

/// Current on-disk schema version. Files without a version are legacy (0).
pub const RECORD_VERSION: u32 = 1;

/// One stored conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Approximate cost, fixed at append time.
    #[serde(default, alias = "tokens")]
    pub size: usize,
}

impl Message {
    /// Build a message stamped no earlier than `not_before`.
    pub(crate) fn new(role: Role, content: String, not_before: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        let timestamp = not_before.map_or(now, |previous| previous.max(now));
        let size = estimate_size(&content);
        Self {
            role,
            content,
            timestamp,
            size,
        }
    }

    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Accepts RFC 3339 timestamps as well as naive ISO-8601 ones written by
/// older versions of the bot, which are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Everything remembered about one user.
///
/// `total_size` is a cache of the sum of message sizes. It is recomputed
/// whenever the record is loaded or mutated and never trusted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(default)]
    pub(crate) version: u32,
    #[serde(default)]
    pub(crate) messages: Vec<Message>,
    #[serde(default = "default_language")]
    pub(crate) language: String,
    #[serde(default, alias = "total_tokens")]
    pub(crate) total_size: usize,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            messages: Vec::new(),
            language: default_language(),
            total_size: 0,
        }
    }
}

impl UserRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub const fn total_size(&self) -> usize {
        self.total_size
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn set_language(&mut self, tag: String) {
        self.language = tag;
    }

    pub(crate) fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.messages.last().map(|m| m.timestamp)
    }

    pub(crate) fn recompute_total(&mut self) {
        self.total_size = self.messages.iter().map(|m| m.size).sum();
    }

    /// Remove the oldest `count` messages and keep `total_size` in step.
    pub(crate) fn evict_front(&mut self, count: usize) -> Vec<Message> {
        let count = count.min(self.messages.len());
        let evicted: Vec<Message> = self.messages.drain(..count).collect();
        let freed: usize = evicted.iter().map(|m| m.size).sum();
        self.total_size = self.total_size.saturating_sub(freed);
        evicted
    }

    /// Bring a freshly deserialized record up to the current schema.
    pub(crate) fn normalize(&mut self) {
        self.version = RECORD_VERSION;
        self.recompute_total();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record() {
        let record = UserRecord::new();
        assert!(record.is_empty());
        assert_eq!(record.total_size(), 0);
        assert_eq!(record.language(), "en");
        assert_eq!(record.version(), RECORD_VERSION);
    }

    #[test]
    fn test_message_timestamp_never_goes_backwards() {
        let future = Utc::now() + chrono::Duration::hours(1);
        let message = Message::new(Role::User, "hi".to_string(), Some(future));
        assert_eq!(message.timestamp, future);
    }

    #[test]
    #[expect(clippy::unwrap_used, reason = "Test failure should panic")]
    fn test_legacy_record_is_accepted() {
        let legacy = r#"{
            "messages": [
                {"role": "user", "content": "hello there", "timestamp": "2024-12-25T10:15:30.123456", "tokens": 2},
                {"role": "assistant", "content": "hi", "timestamp": "2024-12-25T10:15:31.000001", "tokens": 1}
            ],
            "language": "de",
            "current_topic": null,
            "total_tokens": 999
        }"#;

        let mut record: UserRecord = serde_json::from_str(legacy).unwrap();
        assert_eq!(record.version(), 0);
        record.normalize();

        assert_eq!(record.version(), RECORD_VERSION);
        assert_eq!(record.language(), "de");
        assert_eq!(record.len(), 2);
        assert_eq!(record.messages()[1].role, Role::Model);
        assert_eq!(record.total_size(), 3);
    }

    #[test]
    #[expect(clippy::unwrap_used, reason = "Test failure should panic")]
    fn test_missing_fields_take_defaults() {
        let mut record: UserRecord = serde_json::from_str("{}").unwrap();
        record.normalize();
        assert_eq!(record, UserRecord::new());
    }

    #[test]
    fn test_evict_front_updates_total() {
        let mut record = UserRecord::new();
        record
            .messages
            .push(Message::new(Role::User, "a b c".to_string(), None));
        record
            .messages
            .push(Message::new(Role::Model, "d e".to_string(), None));
        record.recompute_total();
        assert_eq!(record.total_size(), 5);

        let evicted = record.evict_front(1);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].content, "a b c");
        assert_eq!(record.total_size(), 2);

        assert!(record.evict_front(10).len() == 1);
        assert_eq!(record.total_size(), 0);
    }
}
