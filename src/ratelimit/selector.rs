//! Profile selection with fallback chains
//!
//! Given a role's ordered fallback chain and the profile that just failed, picks
//! the next usable profile. Selection is round-robin from the failed profile's
//! position so load spreads across accounts instead of always piling onto the
//! first entry; a sticky profile short-circuits the rotation when it is usable.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::cooldown::CooldownStore;
use super::detector::RateLimitEvent;
use crate::{GasTownError, Result};

/// Floor applied to zero-minute cooldowns; an instantly re-available profile
/// would be retried in a hot loop.
const MIN_COOLDOWN_MINUTES: u32 = 5;

/// Profile fallback policy for a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePolicy {
    /// Ordered list of profile names to try
    pub fallback_chain: Vec<String>,

    /// Minutes a profile cools down after a rate limit
    #[serde(default)]
    pub cooldown_minutes: u32,

    /// Preferred profile, chosen whenever it is in the chain and available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stickiness: Option<String>,
}

/// Chooses fallback profiles per role, tracking cooldowns across selections
#[derive(Debug, Default)]
pub struct Selector {
    policies: RwLock<HashMap<String, RolePolicy>>,
    store: CooldownStore,
}

impl Selector {
    /// Create a selector with no policies registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the fallback policy for a role
    pub fn set_policy(&self, role: impl Into<String>, policy: RolePolicy) {
        let mut policies = self.policies.write().unwrap();
        policies.insert(role.into(), policy);
    }

    /// The policy registered for a role, if any
    pub fn get_policy(&self, role: &str) -> Option<RolePolicy> {
        let policies = self.policies.read().unwrap();
        policies.get(role).cloned()
    }

    /// Select the next available profile for a role.
    ///
    /// When `event` is provided and `current_profile` is non-empty, the current
    /// profile is first marked as cooling down per the role's policy. The scan
    /// then proceeds round-robin from the slot after `current_profile` (from the
    /// chain head if it is not in the chain), preferring the sticky profile when
    /// one is configured, present, and available.
    ///
    /// # Errors
    /// - [`GasTownError::NoPolicyForRole`] if the role has no policy
    /// - [`GasTownError::EmptyFallbackChain`] if the chain has no profiles
    /// - [`GasTownError::AllProfilesCooling`] if every profile is cooling down
    pub fn select_next(
        &self,
        role: &str,
        current_profile: &str,
        event: Option<&RateLimitEvent>,
    ) -> Result<String> {
        let policy = self
            .get_policy(role)
            .ok_or_else(|| GasTownError::NoPolicyForRole(role.to_string()))?;

        if policy.fallback_chain.is_empty() {
            return Err(GasTownError::EmptyFallbackChain(role.to_string()));
        }

        if event.is_some() && !current_profile.is_empty() {
            let minutes = if policy.cooldown_minutes == 0 {
                MIN_COOLDOWN_MINUTES
            } else {
                policy.cooldown_minutes
            };
            self.store
                .mark_cooldown(current_profile, Utc::now() + Duration::minutes(i64::from(minutes)));
        }

        if let Some(sticky) = &policy.stickiness {
            if policy.fallback_chain.iter().any(|p| p == sticky) && self.store.is_available(sticky)
            {
                return Ok(sticky.clone());
            }
        }

        let chain = &policy.fallback_chain;
        let start = chain
            .iter()
            .position(|p| p == current_profile)
            .map(|i| i + 1)
            .unwrap_or(0);

        for offset in 0..chain.len() {
            let profile = &chain[(start + offset) % chain.len()];
            if self.store.is_available(profile) {
                return Ok(profile.clone());
            }
        }

        Err(GasTownError::AllProfilesCooling)
    }

    /// Mark a profile as cooling down until the given instant
    pub fn mark_cooldown(&self, profile: &str, until: DateTime<Utc>) {
        self.store.mark_cooldown(profile, until);
    }

    /// Remove a profile's cooldown
    pub fn clear_cooldown(&self, profile: &str) {
        self.store.clear_cooldown(profile);
    }

    /// Check whether a profile is available (not cooling down)
    pub fn is_available(&self, profile: &str) -> bool {
        self.store.is_available(profile)
    }

    /// When the profile's cooldown ends, or `None` if it is not cooling down
    pub fn cooldown_until(&self, profile: &str) -> Option<DateTime<Utc>> {
        self.store.cooldown_until(profile)
    }

    /// Time remaining in a profile's cooldown, zero if not cooling down
    pub fn cooldown_remaining(&self, profile: &str) -> Duration {
        self.store.cooldown_remaining(profile)
    }
}
