//! Service layer: one method per logical forum operation.
//!
//! Multi-statement sequences (comment insert + counter bump, like toggle)
//! live behind single methods so their storage unit of work stays localized.

pub mod comments;
pub mod likes;
pub mod posts;

use chrono::Utc;
use uuid::Uuid;

/// Current time in milliseconds since the epoch, the wire timestamp format.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a fresh opaque string identifier.
///
/// UUIDv7 keeps ids time-ordered like the original time-plus-random scheme;
/// the exact layout is not load-bearing.
#[must_use]
pub fn fresh_id() -> String {
    Uuid::now_v7().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique_and_opaque() {
        let a = fresh_id();
        let b = fresh_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
