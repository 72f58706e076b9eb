//! Token lifecycle configuration.
//!
//! Loaded from environment variables and validated once. Every violation
//! is fatal: a service holding an invalid configuration must refuse to
//! start rather than fail per request.

use crate::error::TokenError;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Minimum secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Refresh TTL must be at least this many times the access TTL.
pub const MIN_TTL_RATIO: i64 = 10;

/// Upper bound on the refresh TTL in days. Also bounds the access TTL
/// through [`MIN_TTL_RATIO`], keeping every `exp` representable.
pub const MAX_REFRESH_TTL_DAYS: i64 = 3650;

/// Recommended refresh TTL range in days.
pub const RECOMMENDED_REFRESH_DAYS: std::ops::RangeInclusive<i64> = 7..=30;

/// JWT signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256
    #[default]
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,
}

impl JwtAlgorithm {
    /// Parse algorithm from string.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        match s.to_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            _ => Err(TokenError::config(format!("Unsupported JWT algorithm: {}", s))),
        }
    }

    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }

    /// The matching `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn to_jwt(self) -> jsonwebtoken::Algorithm {
        match self {
            Self::HS256 => jsonwebtoken::Algorithm::HS256,
            Self::HS384 => jsonwebtoken::Algorithm::HS384,
            Self::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }
}

/// How the rotation engine reacts to lookup failures and token reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationPolicy {
    /// Continue rotation with a placeholder email when the identity
    /// directory cannot resolve the subject. Off by default.
    pub placeholder_email: bool,
    /// Revoke the whole family when an already-consumed refresh token is
    /// presented again. Off by default.
    ///
    /// A client that double-submits one refresh token also counts as reuse:
    /// the losing request revokes the family, taking down the pair the
    /// winning request just returned.
    pub revoke_family_on_reuse: bool,
}

/// Token lifecycle configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret for access tokens
    pub access_secret: SecretString,
    /// Secret for refresh tokens, distinct from the access secret
    pub refresh_secret: SecretString,
    /// Signing algorithm shared by both classes
    pub algorithm: JwtAlgorithm,
    /// Access token TTL in minutes
    pub access_ttl_minutes: i64,
    /// Refresh token TTL in days
    pub refresh_ttl_days: i64,
    /// Rotation behaviour
    pub rotation: RotationPolicy,
}

impl TokenConfig {
    /// Create a configuration with default TTLs (30 minutes / 7 days).
    #[must_use]
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: SecretString::from(access_secret.into()),
            refresh_secret: SecretString::from(refresh_secret.into()),
            algorithm: JwtAlgorithm::default(),
            access_ttl_minutes: 30,
            refresh_ttl_days: 7,
            rotation: RotationPolicy::default(),
        }
    }

    /// Set the signing algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: JwtAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the access token TTL in minutes.
    #[must_use]
    pub const fn with_access_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_ttl_minutes = minutes;
        self
    }

    /// Set the refresh token TTL in days.
    #[must_use]
    pub const fn with_refresh_ttl_days(mut self, days: i64) -> Self {
        self.refresh_ttl_days = days;
        self
    }

    /// Set the rotation policy.
    #[must_use]
    pub const fn with_rotation_policy(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if a secret is missing or a value
    /// cannot be parsed. The result still has to pass [`TokenConfig::validate`].
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`TokenConfig::from_env`] with variables read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if a secret is missing or a value
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_secret = required_env(&lookup, "JWT_SECRET_KEY")?;
        let refresh_secret = required_env(&lookup, "JWT_REFRESH_TOKEN_SECRET_KEY")?;
        let algorithm =
            JwtAlgorithm::parse(&lookup("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string()))?;

        let rotation = RotationPolicy {
            placeholder_email: parse_env(&lookup, "JWT_ROTATION_PLACEHOLDER_EMAIL", false)?,
            revoke_family_on_reuse: parse_env(&lookup, "JWT_REVOKE_FAMILY_ON_REUSE", false)?,
        };

        Ok(Self {
            access_secret: SecretString::from(access_secret),
            refresh_secret: SecretString::from(refresh_secret),
            algorithm,
            access_ttl_minutes: parse_env(&lookup, "JWT_ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            refresh_ttl_days: parse_env(&lookup, "JWT_REFRESH_TOKEN_EXPIRE_DAYS", 7)?,
            rotation,
        })
    }

    /// Check secret strength, secret separation and TTL sanity.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` describing the first violated rule.
    /// The message never contains secret material.
    pub fn validate(&self) -> Result<(), TokenError> {
        let access = self.access_secret.expose_secret().as_bytes();
        let refresh = self.refresh_secret.expose_secret().as_bytes();

        if access.is_empty() || refresh.is_empty() {
            return Err(TokenError::config("JWT secrets must be configured"));
        }
        if access.len() < MIN_SECRET_LEN {
            return Err(TokenError::config(format!(
                "access secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if refresh.len() < MIN_SECRET_LEN {
            return Err(TokenError::config(format!(
                "refresh secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if bool::from(access.ct_eq(refresh)) {
            return Err(TokenError::config(
                "access and refresh token secrets must be different",
            ));
        }

        if self.access_ttl_minutes <= 0 {
            return Err(TokenError::config("access token TTL must be positive"));
        }
        if self.refresh_ttl_days <= 0 {
            return Err(TokenError::config("refresh token TTL must be positive"));
        }
        if self.refresh_ttl_days > MAX_REFRESH_TTL_DAYS {
            return Err(TokenError::config(format!(
                "refresh token TTL must not exceed {} days",
                MAX_REFRESH_TTL_DAYS
            )));
        }
        if self.refresh_ttl_seconds() < self.access_ttl_seconds().saturating_mul(MIN_TTL_RATIO) {
            return Err(TokenError::config(format!(
                "refresh token TTL must be at least {}x the access token TTL",
                MIN_TTL_RATIO
            )));
        }

        if !RECOMMENDED_REFRESH_DAYS.contains(&self.refresh_ttl_days) {
            warn!(
                refresh_ttl_days = self.refresh_ttl_days,
                "Refresh token TTL outside the recommended 7-30 day range"
            );
        }
        if self.rotation.placeholder_email {
            warn!("Rotation will fall back to placeholder emails when identity lookup fails");
        }

        Ok(())
    }

    /// Access token TTL in seconds.
    #[must_use]
    pub const fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_minutes.saturating_mul(60)
    }

    /// Refresh token TTL in seconds.
    #[must_use]
    pub const fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_days.saturating_mul(24 * 60 * 60)
    }
}

fn required_env<F>(lookup: &F, name: &str) -> Result<String, TokenError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(TokenError::config(format!("{} is required", name))),
    }
}

/// Parse environment variable with default value.
fn parse_env<F, T>(lookup: &F, name: &str, default: T) -> Result<T, TokenError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}
