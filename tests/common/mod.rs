//! Shared fixtures for integration tests.

#![allow(dead_code)]

use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use token_lifecycle::{Identity, InMemoryDirectory, RotationPolicy, TokenConfig, TokenService};

pub const ACCESS_SECRET: &str = "integration-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &str = "integration-refresh-secret-0123456789abcdef";

pub fn config() -> TokenConfig {
    TokenConfig::new(ACCESS_SECRET, REFRESH_SECRET)
}

pub fn identity(subject: &str) -> Identity {
    Identity::new(subject, format!("{}@example.com", subject.to_lowercase()))
}

/// Service whose directory knows every subject passed in.
pub fn service_for(subjects: &[&str]) -> TokenService<InMemoryDirectory> {
    service_with_policy(subjects, RotationPolicy::default())
}

pub fn service_with_policy(
    subjects: &[&str],
    policy: RotationPolicy,
) -> TokenService<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();
    for subject in subjects {
        let id = identity(subject);
        directory.insert(id.subject, id.email);
    }
    TokenService::new(config().with_rotation_policy(policy), Arc::new(directory))
        .unwrap()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Sign an arbitrary payload with one of the configured secrets.
pub fn mint(payload: serde_json::Value, secret: &str) -> String {
    encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn refresh_payload(subject: &str, family: &str, iat: i64, exp: i64) -> serde_json::Value {
    serde_json::json!({
        "sub": subject,
        "iat": iat,
        "exp": exp,
        "token_family": family,
        "jti": uuid::Uuid::new_v4().to_string(),
        "token_type": "refresh",
    })
}

pub fn access_payload(subject: &str, iat: i64, exp: i64) -> serde_json::Value {
    serde_json::json!({
        "sub": subject,
        "email": format!("{}@example.com", subject.to_lowercase()),
        "iat": iat,
        "exp": exp,
        "token_type": "access",
    })
}
