//! Approximate size accounting and retention bounding.

use nyxie_core::Role;
use tracing::debug;

use crate::record::{Message, UserRecord};

/// Default retention cap per user, in approximate tokens.
pub const DEFAULT_MAX_RETAINED_SIZE: usize = 1_000_000;

/// Approximate token count: whitespace-delimited words.
///
/// This is only a proxy for the remote tokenizer, so every budget derived
/// from it is advisory.
#[must_use]
pub fn estimate_size(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keeps each record within `max_retained_size` by evicting oldest messages.
#[derive(Debug, Clone, Copy)]
pub struct TokenAccountant {
    max_retained_size: usize,
}

impl Default for TokenAccountant {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETAINED_SIZE)
    }
}

impl TokenAccountant {
    #[must_use]
    pub const fn new(max_retained_size: usize) -> Self {
        Self { max_retained_size }
    }

    #[must_use]
    pub const fn max_retained_size(&self) -> usize {
        self.max_retained_size
    }

    /// Append a message and evict from the front until the record fits.
    ///
    /// The new message itself is never evicted, so a single message larger
    /// than the cap is kept alone. Returns the evicted messages, oldest first.
    /// Persisting the record is left to the caller.
    pub fn append(&self, record: &mut UserRecord, role: Role, content: String) -> Vec<Message> {
        let message = Message::new(role, content, record.last_timestamp());
        record.messages.push(message);
        record.recompute_total();
        self.enforce(record)
    }

    fn enforce(&self, record: &mut UserRecord) -> Vec<Message> {
        let mut remaining = record.total_size;
        let mut count = 0;
        // Stop one short of the newest message.
        for message in &record.messages[..record.messages.len().saturating_sub(1)] {
            if remaining <= self.max_retained_size {
                break;
            }
            remaining -= message.size;
            count += 1;
        }

        if count == 0 {
            return Vec::new();
        }

        let evicted = record.evict_front(count);
        debug!(
            "Evicted {} messages, retained size now {}",
            evicted.len(),
            record.total_size
        );
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(count: usize) -> String {
        vec!["w"; count].join(" ")
    }

    #[test]
    fn test_estimate_size() {
        assert_eq!(estimate_size(""), 0);
        assert_eq!(estimate_size("   "), 0);
        assert_eq!(estimate_size("hello"), 1);
        assert_eq!(estimate_size("  hello \n\t world  "), 2);
        assert_eq!(estimate_size("[Image] What do you see in this image?"), 8);
    }

    #[test]
    fn test_append_records_size_and_total() {
        let accountant = TokenAccountant::default();
        let mut record = UserRecord::new();

        let evicted = accountant.append(&mut record, Role::User, "one two three".to_string());
        assert!(evicted.is_empty());
        accountant.append(&mut record, Role::Model, "four".to_string());

        assert_eq!(record.len(), 2);
        assert_eq!(record.messages()[0].size, 3);
        assert_eq!(record.messages()[1].size, 1);
        assert_eq!(record.total_size(), 4);
    }

    #[test]
    fn test_oversized_message_evicts_everything_before_it() {
        let accountant = TokenAccountant::new(1_000_000);
        let mut record = UserRecord::new();

        accountant.append(&mut record, Role::User, words(100));
        accountant.append(&mut record, Role::Model, words(100));
        let evicted = accountant.append(&mut record, Role::User, words(1_000_000));

        assert_eq!(evicted.len(), 2);
        assert_eq!(record.total_size(), 1_000_000);
        assert_eq!(record.len(), 1);
        assert_eq!(record.messages()[0].size, 1_000_000);
    }

    #[test]
    fn test_single_message_over_cap_is_kept_alone() {
        let accountant = TokenAccountant::new(5);
        let mut record = UserRecord::new();

        accountant.append(&mut record, Role::User, words(2));
        accountant.append(&mut record, Role::Model, words(8));

        assert_eq!(record.len(), 1);
        assert_eq!(record.total_size(), 8);
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let accountant = TokenAccountant::new(6);
        let mut record = UserRecord::new();

        for i in 0..6 {
            accountant.append(&mut record, Role::User, format!("m{i} x"));
        }

        let contents: Vec<&str> = record.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3 x", "m4 x", "m5 x"]);
        assert_eq!(record.total_size(), 6);
    }

    #[test]
    fn test_cap_invariant_holds_after_every_append() {
        let accountant = TokenAccountant::new(20);
        let mut record = UserRecord::new();

        for i in 0..50 {
            accountant.append(&mut record, Role::from_label("user"), words(i % 9));
            let sum: usize = record.messages().iter().map(|m| m.size).sum();
            assert_eq!(record.total_size(), sum);
            assert!(record.total_size() <= 20 || record.len() == 1);
        }
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let accountant = TokenAccountant::default();
        let mut record = UserRecord::new();
        for _ in 0..10 {
            accountant.append(&mut record, Role::User, "tick".to_string());
        }
        assert!(
            record
                .messages()
                .windows(2)
                .all(|pair| pair[0].timestamp <= pair[1].timestamp)
        );
    }
}
