//! Prometheus metrics for the token lifecycle.
//!
//! Registered in the default registry; the host process exposes them.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_gauge_vec, CounterVec, IntGaugeVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_lifecycle_tokens_issued_total",
        "Total number of tokens issued",
        &["token_type", "algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Verification outcomes, labelled by error code or `valid`.
pub static VERIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_lifecycle_verifications_total",
        "Total number of token verifications",
        &["token_type", "outcome"]
    )
    .expect("Failed to register verifications metric")
});

/// Rotation outcomes.
pub static TOKENS_ROTATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_lifecycle_rotations_total",
        "Total number of refresh token rotations",
        &["status"]
    )
    .expect("Failed to register rotations metric")
});

/// Registry insertions by kind (`token`, `family`, `rotation`).
pub static TOKENS_REVOKED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_lifecycle_revocations_total",
        "Total number of revocation registry insertions",
        &["kind"]
    )
    .expect("Failed to register revocations metric")
});

/// Registry size, refreshed on prune.
pub static REGISTRY_ENTRIES: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "token_lifecycle_registry_entries",
        "Entries held by the revocation registry",
        &["kind"]
    )
    .expect("Failed to register registry_entries metric")
});
