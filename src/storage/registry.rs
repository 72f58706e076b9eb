//! In-memory revocation registry.
//!
//! Holds individually revoked refresh tokens (by fingerprint) and revoked
//! token families behind a single mutex. Hashing and payload decoding
//! happen before the lock is taken; critical sections are plain set
//! operations.

use crate::jwt::serializer::JwtSerializer;
use crate::metrics;
use crate::refresh::generator::RefreshTokenGenerator;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Result of the atomic check-and-mark used by rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Token was live and is now recorded as used.
    Consumed,
    /// Token had already been consumed or blacklisted.
    AlreadyConsumed,
    /// Token's family is revoked; nothing was recorded.
    FamilyRevoked,
}

/// Entry counts at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    /// Individually revoked or consumed tokens
    pub revoked_tokens: usize,
    /// Revoked families
    pub revoked_families: usize,
}

#[derive(Default)]
struct RegistryState {
    // fingerprint -> exp of the underlying token, when known
    tokens: HashMap<String, Option<i64>>,
    families: HashSet<String>,
}

/// Authoritative record of revoked refresh tokens and families.
#[derive(Default)]
pub struct RevocationRegistry {
    state: Mutex<RegistryState>,
}

impl RevocationRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section is a single set operation, so a panic in
    // another holder cannot leave the sets half-updated.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Revoke a single refresh token.
    ///
    /// The token's `exp` is read from its payload (unverified) so the entry
    /// can be evicted later; undecodable tokens are kept indefinitely.
    pub fn blacklist_token(&self, token: &str) {
        let fingerprint = RefreshTokenGenerator::fingerprint(token);
        let exp = JwtSerializer::peek_unverified(token).ok().map(|claims| claims.exp);

        let inserted = self.lock().tokens.insert(fingerprint, exp).is_none();
        if inserted {
            metrics::TOKENS_REVOKED.with_label_values(&["token"]).inc();
        }
        debug!(token_fp = %RefreshTokenGenerator::log_id(token), "Blacklisted refresh token");
    }

    /// Revoke every token, past or future, carrying `family_id`.
    pub fn blacklist_family(&self, family_id: &str) {
        let inserted = self.lock().families.insert(family_id.to_string());
        if inserted {
            metrics::TOKENS_REVOKED.with_label_values(&["family"]).inc();
            info!(family_id = %family_id, "Revoked token family");
        }
    }

    /// True if this exact token was revoked or consumed.
    pub fn is_token_blacklisted(&self, token: &str) -> bool {
        let fingerprint = RefreshTokenGenerator::fingerprint(token);
        self.lock().tokens.contains_key(&fingerprint)
    }

    /// True if `family_id` was revoked.
    pub fn is_family_blacklisted(&self, family_id: &str) -> bool {
        self.lock().families.contains(family_id)
    }

    /// Token or family revoked, checked under one lock acquisition.
    pub fn is_revoked(&self, token: &str, family_id: &str) -> bool {
        let fingerprint = RefreshTokenGenerator::fingerprint(token);
        let state = self.lock();
        state.families.contains(family_id) || state.tokens.contains_key(&fingerprint)
    }

    /// Atomically check that `token` is live and mark it consumed.
    ///
    /// Of any number of concurrent calls for the same token, exactly one
    /// observes `Consumed`.
    pub fn consume(&self, token: &str, family_id: &str, exp: i64) -> ConsumeOutcome {
        let fingerprint = RefreshTokenGenerator::fingerprint(token);

        let outcome = {
            let mut state = self.lock();
            if state.families.contains(family_id) {
                ConsumeOutcome::FamilyRevoked
            } else if state.tokens.contains_key(&fingerprint) {
                ConsumeOutcome::AlreadyConsumed
            } else {
                state.tokens.insert(fingerprint, Some(exp));
                ConsumeOutcome::Consumed
            }
        };

        if outcome == ConsumeOutcome::Consumed {
            metrics::TOKENS_REVOKED.with_label_values(&["rotation"]).inc();
        }
        outcome
    }

    /// Drop token entries whose token expired before `now`.
    ///
    /// Such tokens already fail verification as expired, so dropping them
    /// changes no outcome. Family entries are never evicted.
    pub fn evict_expired(&self, now: i64) -> usize {
        let mut state = self.lock();
        let before = state.tokens.len();
        state.tokens.retain(|_, exp| exp.is_none_or(|exp| exp >= now));
        before - state.tokens.len()
    }

    /// Current entry counts.
    pub fn stats(&self) -> RegistryStats {
        let state = self.lock();
        RegistryStats {
            revoked_tokens: state.tokens.len(),
            revoked_families: state.families.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_token() {
        let registry = RevocationRegistry::new();

        assert!(!registry.is_token_blacklisted("token-a"));
        registry.blacklist_token("token-a");
        assert!(registry.is_token_blacklisted("token-a"));
        assert!(!registry.is_token_blacklisted("token-b"));
    }

    #[test]
    fn test_blacklist_family() {
        let registry = RevocationRegistry::new();

        registry.blacklist_family("family-1");
        assert!(registry.is_family_blacklisted("family-1"));
        assert!(!registry.is_family_blacklisted("family-2"));
        assert!(registry.is_revoked("any-token", "family-1"));
        assert!(!registry.is_revoked("any-token", "family-2"));
    }

    #[test]
    fn test_consume_once() {
        let registry = RevocationRegistry::new();

        assert_eq!(registry.consume("token-a", "family-1", 100), ConsumeOutcome::Consumed);
        assert_eq!(
            registry.consume("token-a", "family-1", 100),
            ConsumeOutcome::AlreadyConsumed
        );
        assert!(registry.is_token_blacklisted("token-a"));
    }

    #[test]
    fn test_consume_revoked_family() {
        let registry = RevocationRegistry::new();
        registry.blacklist_family("family-1");

        assert_eq!(
            registry.consume("token-a", "family-1", 100),
            ConsumeOutcome::FamilyRevoked
        );
        assert!(!registry.is_token_blacklisted("token-a"));
    }

    #[test]
    fn test_evict_expired_keeps_live_and_families() {
        let registry = RevocationRegistry::new();
        registry.consume("old", "family-1", 100);
        registry.consume("boundary", "family-1", 200);
        registry.consume("live", "family-1", 300);
        registry.blacklist_token("not-a-jwt");
        registry.blacklist_family("family-2");

        assert_eq!(registry.evict_expired(200), 1);
        assert!(!registry.is_token_blacklisted("old"));
        assert!(registry.is_token_blacklisted("boundary"));
        assert!(registry.is_token_blacklisted("live"));
        assert!(registry.is_token_blacklisted("not-a-jwt"));
        assert!(registry.is_family_blacklisted("family-2"));

        assert_eq!(
            registry.stats(),
            RegistryStats {
                revoked_tokens: 3,
                revoked_families: 1
            }
        );
    }

    #[test]
    fn test_instances_are_isolated() {
        let a = RevocationRegistry::new();
        let b = RevocationRegistry::new();

        a.blacklist_token("token-a");
        a.blacklist_family("family-1");

        assert!(!b.is_token_blacklisted("token-a"));
        assert!(!b.is_family_blacklisted("family-1"));
    }
}
