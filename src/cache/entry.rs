//! Stored Entry Module
//!
//! A byte payload held by the in-memory store together with its expiry deadline.

use std::time::{Duration, Instant};

// == Stored Entry ==
/// An opaque cache payload with a TTL deadline.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The stored bytes, envelope included
    pub value: Vec<u8>,
    /// Instant after which the entry is gone
    pub expires_at: Instant,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl_seconds` from now.
    ///
    /// Returns `None` when the deadline is not representable as an `Instant`.
    pub fn new(value: Vec<u8>, ttl_seconds: u64) -> Option<Self> {
        let expires_at = Instant::now().checked_add(Duration::from_secs(ttl_seconds))?;
        Some(Self { value, expires_at })
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its deadline, so a
    /// zero TTL produces an entry that is never readable.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Remaining lifetime, or zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = StoredEntry::new(b"payload".to_vec(), 60).unwrap();

        assert_eq!(entry.value, b"payload");
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = StoredEntry::new(b"payload".to_vec(), 1).unwrap();
        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = StoredEntry::new(Vec::new(), 10).unwrap();

        let remaining = entry.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = StoredEntry::new(b"x".to_vec(), 0).unwrap();
        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }

    #[test]
    fn test_unrepresentable_deadline_is_rejected() {
        assert!(StoredEntry::new(b"x".to_vec(), u64::MAX).is_none());
    }
}
