//! JWT claims for both token classes.

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential class. Each class is signed with its own secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    /// Short-lived bearer credential
    Access,
    /// Long-lived credential exchanged for a new pair
    Refresh,
}

impl TokenClass {
    /// Value of the `token_type` claim.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }

    /// The opposite class.
    #[must_use]
    pub const fn other(&self) -> Self {
        match self {
            TokenClass::Access => TokenClass::Refresh,
            TokenClass::Refresh => TokenClass::Access,
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified subject handed in by the external identity step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id, becomes `sub`
    pub subject: String,
    /// Current email, embedded in access tokens
    pub email: String,
}

impl Identity {
    /// Create an identity.
    pub fn new(subject: impl Into<String>, email: impl Into<String>) -> Self {
        Identity {
            subject: subject.into(),
            email: email.into(),
        }
    }
}

/// Wire payload shared by both classes.
///
/// Every class-specific field is optional here so that a token of the
/// wrong class still decodes and can be reported as such.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,

    /// `access` or `refresh`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Subject email, access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Rotation lineage id, refresh tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_family: Option<String>,

    /// Unique per token so that two pairs minted in the same second differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Access claims for `identity`, valid for `ttl_seconds` from `now`.
    pub fn access(identity: &Identity, now: i64, ttl_seconds: i64) -> Self {
        Claims {
            sub: identity.subject.clone(),
            iat: now,
            exp: now.saturating_add(ttl_seconds),
            token_type: Some(TokenClass::Access.as_str().to_string()),
            email: Some(identity.email.clone()),
            token_family: None,
            jti: Some(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Refresh claims in `family_id`, valid for `ttl_seconds` from `now`.
    pub fn refresh(subject: &str, family_id: &str, now: i64, ttl_seconds: i64) -> Self {
        Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(ttl_seconds),
            token_type: Some(TokenClass::Refresh.as_str().to_string()),
            email: None,
            token_family: Some(family_id.to_string()),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// The class named by the `token_type` claim, if recognised.
    pub fn class(&self) -> Option<TokenClass> {
        match self.token_type.as_deref() {
            Some("access") => Some(TokenClass::Access),
            Some("refresh") => Some(TokenClass::Refresh),
            _ => None,
        }
    }

    /// True once `timestamp` is past `exp`.
    pub fn is_expired_at(&self, timestamp: i64) -> bool {
        self.exp < timestamp
    }

    /// Check the fields a token of `class` must carry.
    pub fn require_shape(&self, class: TokenClass) -> Result<(), TokenError> {
        if self.sub.is_empty() || self.iat >= self.exp {
            return Err(TokenError::Malformed);
        }
        let complete = match class {
            TokenClass::Access => self.email.as_deref().is_some_and(|e| !e.is_empty()),
            TokenClass::Refresh => {
                self.token_family.as_deref().is_some_and(|f| !f.is_empty())
                    && self.jti.as_deref().is_some_and(|j| !j.is_empty())
            }
        };
        if complete {
            Ok(())
        } else {
            Err(TokenError::Malformed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims_creation() {
        let identity = Identity::new("user-123", "lifter@example.com");
        let claims = Claims::access(&identity, 1_000, 1_800);

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.exp, 2_800);
        assert_eq!(claims.class(), Some(TokenClass::Access));
        assert!(claims.token_family.is_none());
        assert!(claims.require_shape(TokenClass::Access).is_ok());
        assert!(claims.require_shape(TokenClass::Refresh).is_err());
    }

    #[test]
    fn test_refresh_claims_have_unique_jti() {
        let a = Claims::refresh("user-123", "family-1", 1_000, 604_800);
        let b = Claims::refresh("user-123", "family-1", 1_000, 604_800);

        assert_eq!(a.token_family, b.token_family);
        assert_ne!(a.jti, b.jti);
        assert!(a.email.is_none());
        assert!(a.require_shape(TokenClass::Refresh).is_ok());
    }

    #[test]
    fn test_unknown_token_type() {
        let mut claims = Claims::refresh("user-123", "family-1", 1_000, 60);
        claims.token_type = Some("id".to_string());
        assert_eq!(claims.class(), None);
        claims.token_type = None;
        assert_eq!(claims.class(), None);
    }

    #[test]
    fn test_wire_names() {
        let claims = Claims::refresh("user-123", "family-1", 1_000, 60);
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["token_type"], "refresh");
        assert_eq!(json["token_family"], "family-1");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = Claims::refresh("user-123", "family-1", 1_000, 60);
        assert!(!claims.is_expired_at(1_060));
        assert!(claims.is_expired_at(1_061));
    }
}
