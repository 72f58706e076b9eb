//! Single-use refresh token rotation.

use crate::config::RotationPolicy;
use crate::error::TokenError;
use crate::identity::IdentityDirectory;
use crate::jwt::claims::{Identity, TokenClass};
use crate::jwt::issuer::{TokenIssuer, TokenPair};
use crate::jwt::verifier::TokenVerifier;
use crate::metrics;
use crate::refresh::generator::RefreshTokenGenerator;
use crate::storage::{ConsumeOutcome, RevocationRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// Exchanges a refresh token for a new pair in the same family.
///
/// The presented token is consumed through a single check-and-mark on the
/// registry after the new pair has been minted, so signing never happens
/// under the registry lock and two racing rotations of one token cannot
/// both succeed.
pub struct RefreshTokenRotator<D> {
    verifier: Arc<TokenVerifier>,
    issuer: Arc<TokenIssuer>,
    registry: Arc<RevocationRegistry>,
    directory: Arc<D>,
    policy: RotationPolicy,
}

impl<D: IdentityDirectory> RefreshTokenRotator<D> {
    /// Wire the rotator to the service's shared components.
    pub fn new(
        verifier: Arc<TokenVerifier>,
        issuer: Arc<TokenIssuer>,
        registry: Arc<RevocationRegistry>,
        directory: Arc<D>,
        policy: RotationPolicy,
    ) -> Self {
        RefreshTokenRotator {
            verifier,
            issuer,
            registry,
            directory,
            policy,
        }
    }

    /// Consume `refresh_token` and return a new pair in its family.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let result = self.try_rotate(refresh_token).await;

        let status = match &result {
            Ok(_) => "success",
            Err(err) => err.code(),
        };
        metrics::TOKENS_ROTATED.with_label_values(&[status]).inc();

        result
    }

    async fn try_rotate(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let claims = match self.verifier.verify(refresh_token, TokenClass::Refresh) {
            Ok(claims) => claims,
            Err(TokenError::Blacklisted) => {
                self.on_reuse(refresh_token);
                return Err(TokenError::Blacklisted);
            }
            Err(err) => return Err(err),
        };

        let family_id = claims.token_family.clone().ok_or(TokenError::Malformed)?;
        let email = self.resolve_email(&claims.sub).await?;
        let identity = Identity::new(claims.sub.clone(), email);

        let pair = self.issuer.issue(&identity, Some(family_id.as_str()))?;

        match self.registry.consume(refresh_token, &family_id, claims.exp) {
            ConsumeOutcome::Consumed => {
                info!(
                    subject = %claims.sub,
                    family_id = %family_id,
                    token_fp = %RefreshTokenGenerator::log_id(refresh_token),
                    "Rotated refresh token"
                );
                Ok(pair)
            }
            ConsumeOutcome::AlreadyConsumed => {
                // Lost a race against a concurrent rotation of the same token
                self.on_reuse(refresh_token);
                Err(TokenError::Blacklisted)
            }
            ConsumeOutcome::FamilyRevoked => Err(TokenError::Blacklisted),
        }
    }

    async fn resolve_email(&self, subject: &str) -> Result<String, TokenError> {
        let found = match self.directory.lookup_email(subject).await {
            Ok(found) => found,
            Err(err) => {
                warn!(subject = %subject, reason = err.code(), "Identity lookup failed");
                None
            }
        };

        match found {
            Some(email) => Ok(email),
            None if self.policy.placeholder_email => {
                warn!(
                    subject = %subject,
                    "Rotating with placeholder email; access token email claim is not authoritative"
                );
                Ok(placeholder_email(subject))
            }
            None => Err(TokenError::IdentityUnavailable),
        }
    }

    fn on_reuse(&self, refresh_token: &str) {
        // Blacklisted because the family is revoked, not because of reuse
        let Some(family_id) = self.verifier.family_of_consumed(refresh_token) else {
            return;
        };

        warn!(
            family_id = %family_id,
            token_fp = %RefreshTokenGenerator::log_id(refresh_token),
            "Refresh token reuse detected"
        );

        if self.policy.revoke_family_on_reuse {
            self.registry.blacklist_family(&family_id);
        }
    }
}

/// Recorded stand-in used only under `RotationPolicy::placeholder_email`.
pub fn placeholder_email(subject: &str) -> String {
    format!("user-{}@placeholder.invalid", subject)
}
