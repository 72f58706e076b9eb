//! Token lifecycle facade.
//!
//! One `TokenService` per process is handed to request handlers. It owns
//! the issuer, verifier, rotation engine and metadata utility, all sharing
//! one revocation registry. Tests build as many isolated instances as they
//! need.

use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::identity::IdentityDirectory;
use crate::jwt::{Claims, Identity, JwtSerializer, TokenClass, TokenIssuer, TokenPair, TokenVerifier};
use crate::metadata::{TokenInspector, TokenMetadata};
use crate::metrics;
use crate::refresh::RefreshTokenRotator;
use crate::storage::{RegistryStats, RevocationRegistry};
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point for issuing, verifying, rotating and revoking tokens.
pub struct TokenService<D> {
    issuer: Arc<TokenIssuer>,
    verifier: Arc<TokenVerifier>,
    rotator: RefreshTokenRotator<D>,
    inspector: TokenInspector,
    registry: Arc<RevocationRegistry>,
}

impl<D: IdentityDirectory> TokenService<D> {
    /// Validate `config` and build the service with a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if secrets or TTLs are unusable.
    pub fn new(config: TokenConfig, directory: Arc<D>) -> Result<Self, TokenError> {
        Self::with_registry(config, directory, Arc::new(RevocationRegistry::new()))
    }

    /// Same as [`TokenService::new`] with an injected registry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if secrets or TTLs are unusable.
    pub fn with_registry(
        config: TokenConfig,
        directory: Arc<D>,
        registry: Arc<RevocationRegistry>,
    ) -> Result<Self, TokenError> {
        config.validate()?;

        let serializer = Arc::new(JwtSerializer::new(&config));
        let issuer = Arc::new(TokenIssuer::new(serializer.clone(), &config));
        let verifier = Arc::new(TokenVerifier::new(serializer.clone(), registry.clone()));
        let rotator = RefreshTokenRotator::new(
            verifier.clone(),
            issuer.clone(),
            registry.clone(),
            directory,
            config.rotation,
        );

        info!(
            algorithm = config.algorithm.as_str(),
            access_ttl_minutes = config.access_ttl_minutes,
            refresh_ttl_days = config.refresh_ttl_days,
            "Token service initialized"
        );

        Ok(TokenService {
            issuer,
            verifier,
            rotator,
            inspector: TokenInspector::new(serializer),
            registry,
        })
    }

    /// Mint a pair for a verified identity, optionally continuing a family.
    pub fn issue(&self, identity: &Identity, family_id: Option<&str>) -> Result<TokenPair, TokenError> {
        self.issuer.issue(identity, family_id)
    }

    /// Verify `token` as `class`.
    pub fn verify(&self, token: &str, class: TokenClass) -> Result<Claims, TokenError> {
        self.verifier.verify(token, class)
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verifier.verify(token, TokenClass::Access)
    }

    /// Verify a refresh token, including revocation state.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verifier.verify(token, TokenClass::Refresh)
    }

    /// Exchange a refresh token for a new pair in the same family.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        self.rotator.rotate(refresh_token).await
    }

    /// Revoke every refresh token of `family_id`.
    pub fn revoke_family(&self, family_id: &str) {
        self.registry.blacklist_family(family_id);
    }

    /// Logout: blacklist a refresh token that carries our signature.
    ///
    /// Expired or already revoked tokens are accepted silently since they
    /// can no longer be used anyway.
    pub fn revoke_refresh_token(&self, refresh_token: &str) -> Result<(), TokenError> {
        match self.verifier.verify(refresh_token, TokenClass::Refresh) {
            Ok(_) => {
                self.registry.blacklist_token(refresh_token);
                Ok(())
            }
            Err(TokenError::Expired | TokenError::Blacklisted) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Signature-checked metadata, expiry ignored.
    pub fn extract_metadata(&self, token: &str, class: TokenClass) -> Result<TokenMetadata, TokenError> {
        self.inspector.extract_metadata(token, class)
    }

    /// True when `token` expires within `buffer_minutes` or cannot be read.
    pub fn is_near_expiry(&self, token: &str, buffer_minutes: i64) -> bool {
        self.inspector.is_near_expiry(token, buffer_minutes)
    }

    /// Evict registry entries for tokens that have expired anyway.
    pub fn prune_revocations(&self) -> usize {
        let evicted = self.registry.evict_expired(chrono::Utc::now().timestamp());
        let stats = self.registry.stats();

        metrics::REGISTRY_ENTRIES
            .with_label_values(&["token"])
            .set(i64::try_from(stats.revoked_tokens).unwrap_or(i64::MAX));
        metrics::REGISTRY_ENTRIES
            .with_label_values(&["family"])
            .set(i64::try_from(stats.revoked_families).unwrap_or(i64::MAX));

        debug!(
            evicted,
            revoked_tokens = stats.revoked_tokens,
            revoked_families = stats.revoked_families,
            "Pruned revocation registry"
        );
        evicted
    }

    /// Shared revocation registry.
    pub fn registry(&self) -> &Arc<RevocationRegistry> {
        &self.registry
    }

    /// Current registry entry counts.
    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}
