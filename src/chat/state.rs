//! Per-user conversation state.
//!
//! A single slot per user: the SKU last offered to them and which question
//! they were asked about it. The store is an injected interface so the
//! in-memory map can be swapped for an external cache without touching the
//! resolver.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Which question the pending SKU is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStage {
    /// Product proposed, awaiting yes/no.
    Offered,
    /// Customer said yes, awaiting COD/UPI choice.
    PaymentChoice,
}

#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub last_sku: String,
    pub stage: PendingStage,
    pub set_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(last_sku: impl Into<String>, stage: PendingStage) -> Self {
        Self {
            last_sku: last_sku.into(),
            stage,
            set_at: Utc::now(),
        }
    }
}

/// Keyed by the sender id (phone number). Last write wins on races.
pub trait ConversationStore: Send + Sync {
    fn get(&self, key: &str) -> Option<ConversationEntry>;
    fn set(&self, key: &str, entry: ConversationEntry);
    fn clear(&self, key: &str);
}

/// In-memory conversation store with lazy TTL expiry.
///
/// Entries older than the TTL are treated as absent and dropped on read, so
/// an abandoned pending choice cannot capture an unrelated "yes" sent days
/// later. A TTL of zero disables expiry.
pub struct InMemoryConversationStore {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, ConversationEntry>>,
}

impl InMemoryConversationStore {
    pub fn new(ttl_secs: u64) -> Self {
        let ttl = if ttl_secs == 0 {
            None
        } else {
            Some(Duration::seconds(ttl_secs as i64))
        };
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn is_expired(&self, entry: &ConversationEntry) -> bool {
        match self.ttl {
            Some(ttl) => Utc::now() - entry.set_at > ttl,
            None => false,
        }
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn get(&self, key: &str) -> Option<ConversationEntry> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some(entry) if self.is_expired(entry) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        }
    }

    fn set(&self, key: &str, entry: ConversationEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    fn clear(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let store = InMemoryConversationStore::new(0);
        assert!(store.get("p1").is_none());

        store.set("p1", ConversationEntry::new("sku1", PendingStage::Offered));
        let entry = store.get("p1").unwrap();
        assert_eq!(entry.last_sku, "sku1");
        assert_eq!(entry.stage, PendingStage::Offered);

        store.clear("p1");
        assert!(store.get("p1").is_none());
    }

    #[test]
    fn test_users_are_independent() {
        let store = InMemoryConversationStore::new(0);
        store.set("p1", ConversationEntry::new("sku1", PendingStage::Offered));
        store.set("p2", ConversationEntry::new("sku2", PendingStage::PaymentChoice));

        store.clear("p1");
        assert!(store.get("p1").is_none());
        assert_eq!(store.get("p2").unwrap().last_sku, "sku2");
    }

    #[test]
    fn test_stale_entries_expire_on_read() {
        let store = InMemoryConversationStore::new(60);

        let stale = ConversationEntry {
            last_sku: "sku1".into(),
            stage: PendingStage::Offered,
            set_at: Utc::now() - Duration::seconds(3600),
        };
        store.set("p1", stale);
        assert!(store.get("p1").is_none());

        store.set("p1", ConversationEntry::new("sku2", PendingStage::Offered));
        assert_eq!(store.get("p1").unwrap().last_sku, "sku2");
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let store = InMemoryConversationStore::new(0);
        let old = ConversationEntry {
            last_sku: "sku1".into(),
            stage: PendingStage::Offered,
            set_at: Utc::now() - Duration::days(30),
        };
        store.set("p1", old);
        assert!(store.get("p1").is_some());
    }
}
