//! Profile cooldown tracking
//!
//! In-memory map from credential profile to the instant it becomes usable again.
//! Entries expire lazily: nothing removes them, a profile is simply available once
//! its instant has passed.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

/// Thread-safe store of per-profile cooldowns
#[derive(Debug, Default)]
pub struct CooldownStore {
    cooldowns: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl CooldownStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a profile as cooling down until the given instant, overwriting any
    /// existing entry
    pub fn mark_cooldown(&self, profile: &str, until: DateTime<Utc>) {
        let mut cooldowns = self.cooldowns.write().unwrap();
        cooldowns.insert(profile.to_string(), until);
    }

    /// Remove a profile's cooldown entry
    pub fn clear_cooldown(&self, profile: &str) {
        let mut cooldowns = self.cooldowns.write().unwrap();
        cooldowns.remove(profile);
    }

    /// Check whether a profile is usable: no entry, or the entry has passed
    pub fn is_available(&self, profile: &str) -> bool {
        let cooldowns = self.cooldowns.read().unwrap();
        match cooldowns.get(profile) {
            Some(until) => *until <= Utc::now(),
            None => true,
        }
    }

    /// When the profile's cooldown ends, or `None` if it is not cooling down
    pub fn cooldown_until(&self, profile: &str) -> Option<DateTime<Utc>> {
        let cooldowns = self.cooldowns.read().unwrap();
        cooldowns.get(profile).copied()
    }

    /// Time remaining in a profile's cooldown, zero if not cooling down
    pub fn cooldown_remaining(&self, profile: &str) -> Duration {
        match self.cooldown_until(profile) {
            Some(until) => (until - Utc::now()).max(Duration::zero()),
            None => Duration::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_check() {
        let store = CooldownStore::new();

        assert!(store.is_available("profile1"));

        store.mark_cooldown("profile1", Utc::now() + Duration::minutes(5));
        assert!(!store.is_available("profile1"));

        // Other profiles unaffected
        assert!(store.is_available("profile2"));
    }

    #[test]
    fn test_expired_cooldown() {
        let store = CooldownStore::new();

        store.mark_cooldown("profile1", Utc::now() - Duration::minutes(1));
        assert!(store.is_available("profile1"));
    }

    #[test]
    fn test_clear_cooldown() {
        let store = CooldownStore::new();

        store.mark_cooldown("profile1", Utc::now() + Duration::minutes(5));
        assert!(!store.is_available("profile1"));

        store.clear_cooldown("profile1");
        assert!(store.is_available("profile1"));
    }

    #[test]
    fn test_cooldown_until() {
        let store = CooldownStore::new();

        assert!(store.cooldown_until("profile1").is_none());

        let until = Utc::now() + Duration::minutes(5);
        store.mark_cooldown("profile1", until);
        assert_eq!(store.cooldown_until("profile1"), Some(until));
    }

    #[test]
    fn test_remark_overwrites() {
        let store = CooldownStore::new();

        store.mark_cooldown("profile1", Utc::now() + Duration::minutes(5));
        store.mark_cooldown("profile1", Utc::now() - Duration::minutes(1));
        assert!(store.is_available("profile1"));

        store.mark_cooldown("profile1", Utc::now() + Duration::minutes(10));
        assert!(!store.is_available("profile1"));
    }

    #[test]
    fn test_cooldown_remaining() {
        let store = CooldownStore::new();

        assert_eq!(store.cooldown_remaining("profile1"), Duration::zero());

        store.mark_cooldown("profile1", Utc::now() + Duration::minutes(5));
        let remaining = store.cooldown_remaining("profile1");
        assert!(remaining > Duration::minutes(4));
        assert!(remaining <= Duration::minutes(5));

        // Expired entries report zero, not negative
        store.mark_cooldown("profile1", Utc::now() - Duration::minutes(1));
        assert_eq!(store.cooldown_remaining("profile1"), Duration::zero());
    }
}
