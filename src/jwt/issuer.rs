//! Token pair issuance.

use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::jwt::claims::{Claims, Identity, TokenClass};
use crate::jwt::serializer::JwtSerializer;
use crate::metrics;
use crate::refresh::generator::RefreshTokenGenerator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// `token_type` reported to clients.
pub const BEARER: &str = "bearer";

/// Flat token pair handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,
    /// Signed refresh token
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub access_expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
    /// Always [`BEARER`]
    pub token_type: String,
}

/// Mints access/refresh pairs.
pub struct TokenIssuer {
    serializer: Arc<JwtSerializer>,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenIssuer {
    /// `config` must already have passed validation.
    pub fn new(serializer: Arc<JwtSerializer>, config: &TokenConfig) -> Self {
        TokenIssuer {
            serializer,
            access_ttl_seconds: config.access_ttl_seconds(),
            refresh_ttl_seconds: config.refresh_ttl_seconds(),
        }
    }

    /// Access token lifetime in seconds.
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    /// Issue a pair for `identity`, continuing `family_id` when given.
    pub fn issue(&self, identity: &Identity, family_id: Option<&str>) -> Result<TokenPair, TokenError> {
        let family_id = match family_id {
            Some(id) => id.to_string(),
            None => RefreshTokenGenerator::generate_family_id(),
        };
        let now = chrono::Utc::now().timestamp();

        let access_claims = Claims::access(identity, now, self.access_ttl_seconds());
        let refresh_claims =
            Claims::refresh(&identity.subject, &family_id, now, self.refresh_ttl_seconds());

        let access_token = self.serializer.serialize(&access_claims, TokenClass::Access)?;
        let refresh_token = self.serializer.serialize(&refresh_claims, TokenClass::Refresh)?;

        let algorithm = self.serializer.algorithm().as_str();
        metrics::TOKENS_ISSUED
            .with_label_values(&[TokenClass::Access.as_str(), algorithm])
            .inc();
        metrics::TOKENS_ISSUED
            .with_label_values(&[TokenClass::Refresh.as_str(), algorithm])
            .inc();

        debug!(
            subject = %identity.subject,
            family_id = %family_id,
            "Issued token pair"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_in: self.access_ttl_seconds(),
            refresh_expires_in: self.refresh_ttl_seconds(),
            token_type: BEARER.to_string(),
        })
    }
}
