//! Non-authoritative token introspection.
//!
//! Signatures are checked but expiry and revocation are not. Results feed
//! diagnostics and client hints ("refresh soon"), never authorization.

use crate::error::TokenError;
use crate::jwt::claims::{Claims, TokenClass};
use crate::jwt::serializer::JwtSerializer;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Decoded token fields, not an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    /// Subject (user id)
    pub subject: String,
    /// Issued at
    pub issued_at: DateTime<Utc>,
    /// Expiration
    pub expires_at: DateTime<Utc>,
    /// Class named by the token, or the requested class when absent
    pub token_type: TokenClass,
    /// Email, access tokens only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Family id, refresh tokens only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

impl TokenMetadata {
    fn from_claims(claims: Claims, class: TokenClass) -> Result<Self, TokenError> {
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Malformed)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;
        let token_type = claims.class().unwrap_or(class);

        Ok(TokenMetadata {
            subject: claims.sub,
            issued_at,
            expires_at,
            token_type,
            email: claims.email,
            family: claims.token_family,
        })
    }
}

/// Reads metadata and expiry hints from signed tokens.
pub struct TokenInspector {
    serializer: Arc<JwtSerializer>,
}

impl TokenInspector {
    /// Create an inspector sharing the service's keys.
    pub fn new(serializer: Arc<JwtSerializer>) -> Self {
        TokenInspector { serializer }
    }

    /// Decode with the secret of `class`, ignoring expiry.
    pub fn extract_metadata(&self, token: &str, class: TokenClass) -> Result<TokenMetadata, TokenError> {
        let claims = self.serializer.deserialize(token, class)?;
        TokenMetadata::from_claims(claims, class)
    }

    /// True when the token expires within `buffer_minutes`.
    ///
    /// Fails closed: a token that decodes under neither secret counts as
    /// expired.
    pub fn is_near_expiry(&self, token: &str, buffer_minutes: i64) -> bool {
        self.is_near_expiry_at(token, buffer_minutes, Utc::now())
    }

    fn is_near_expiry_at(&self, token: &str, buffer_minutes: i64, now: DateTime<Utc>) -> bool {
        let claims = self
            .serializer
            .deserialize(token, TokenClass::Access)
            .or_else(|_| self.serializer.deserialize(token, TokenClass::Refresh));

        let Ok(claims) = claims else {
            return true;
        };
        let Some(expires_at) = DateTime::from_timestamp(claims.exp, 0) else {
            return true;
        };

        let Some(horizon) =
            Duration::try_minutes(buffer_minutes).and_then(|buffer| now.checked_add_signed(buffer))
        else {
            return true;
        };
        expires_at <= horizon
    }
}
