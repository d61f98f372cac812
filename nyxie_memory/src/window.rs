//! Context window selection.
//!
//! The retention cap bounds what is remembered; the window bounds what is sent
//! with the next request. The two budgets are independent.

use crate::record::Message;

/// Default window budget, in approximate tokens.
pub const DEFAULT_CONTEXT_BUDGET: usize = 2000;

/// Most recent contiguous run of `messages` whose sizes sum to at most `budget`.
///
/// Scans newest to oldest and stops before the first message that would
/// overflow the budget, so the result is always a suffix in chronological
/// order. If the newest message alone is larger than `budget` the window is
/// empty; messages are never truncated.
#[must_use]
pub fn select_window(messages: &[Message], budget: usize) -> &[Message] {
    let mut used = 0_usize;
    let mut start = messages.len();

    for (index, message) in messages.iter().enumerate().rev() {
        match used.checked_add(message.size) {
            Some(total) if total <= budget => {
                used = total;
                start = index;
            }
            _ => break,
        }
    }

    &messages[start..]
}

/// Total approximate size of a window.
#[must_use]
pub fn window_size(window: &[Message]) -> usize {
    window.iter().map(|m| m.size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenAccountant;
    use crate::record::UserRecord;
    use nyxie_core::Role;

    fn record_with_sizes(sizes: &[usize]) -> UserRecord {
        let accountant = TokenAccountant::default();
        let mut record = UserRecord::new();
        for (i, &size) in sizes.iter().enumerate() {
            let role = if i % 2 == 0 { Role::User } else { Role::Model };
            let content = (0..size)
                .map(|w| format!("m{i}w{w}"))
                .collect::<Vec<_>>()
                .join(" ");
            accountant.append(&mut record, role, content);
        }
        record
    }

    #[test]
    fn test_budget_twelve_over_fives_keeps_last_two() {
        let record = record_with_sizes(&[5, 5, 5, 5]);
        let window = select_window(record.messages(), 12);

        assert_eq!(window.len(), 2);
        assert_eq!(window, &record.messages()[2..]);
        assert_eq!(window_size(window), 10);
    }

    #[test]
    fn test_empty_history() {
        assert!(select_window(&[], 100).is_empty());
    }

    #[test]
    fn test_newest_message_over_budget_gives_empty_window() {
        let record = record_with_sizes(&[1, 1, 50]);
        assert!(select_window(record.messages(), 10).is_empty());
    }

    #[test]
    fn test_stops_at_first_overflow_without_skipping() {
        // The 1-sized oldest message would fit, but it sits behind the 20.
        let record = record_with_sizes(&[1, 20, 3, 3]);
        let window = select_window(record.messages(), 10);
        assert_eq!(window, &record.messages()[2..]);
    }

    #[test]
    fn test_whole_history_fits() {
        let record = record_with_sizes(&[3, 4, 5]);
        let window = select_window(record.messages(), 12);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_window_is_chronological() {
        let record = record_with_sizes(&[2, 2, 2, 2, 2]);
        let window = select_window(record.messages(), 6);
        assert_eq!(window.len(), 3);
        assert!(window.windows(2).all(|p| p[0].timestamp <= p[1].timestamp));
        assert!(window[0].content.starts_with("m2"));
        assert!(window[2].content.starts_with("m4"));
    }

    #[test]
    fn test_larger_budget_contains_smaller_window() {
        let record = record_with_sizes(&[7, 3, 9, 1, 4, 6, 2, 8]);
        let messages = record.messages();

        for small in 0..50 {
            for large in small..50 {
                let a = select_window(messages, small);
                let b = select_window(messages, large);
                assert!(a.len() <= b.len());
                assert_eq!(a, &b[b.len() - a.len()..]);
                assert!(window_size(a) <= small);
            }
        }
    }

    #[test]
    fn test_zero_sized_messages_fit_zero_budget() {
        let record = record_with_sizes(&[4, 0, 0]);
        let window = select_window(record.messages(), 0);
        assert_eq!(window.len(), 2);
    }
}
