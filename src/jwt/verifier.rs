//! Token verification.
//!
//! Checks run in a fixed order and the first failure is final:
//!
//! 1. signature with the secret of the requested class
//! 2. `token_type` matches the class, class-specific claims present
//! 3. `exp` not in the past (no leeway)
//! 4. refresh class only: neither the token nor its family is revoked
//!
//! Access tokens never touch the revocation registry.

use crate::error::TokenError;
use crate::jwt::claims::{Claims, TokenClass};
use crate::jwt::serializer::JwtSerializer;
use crate::metrics;
use crate::refresh::generator::RefreshTokenGenerator;
use crate::storage::RevocationRegistry;
use std::sync::Arc;
use tracing::debug;

/// Verifies tokens of either class against keys and the registry.
pub struct TokenVerifier {
    serializer: Arc<JwtSerializer>,
    registry: Arc<RevocationRegistry>,
}

impl TokenVerifier {
    /// Create a verifier over `registry`.
    pub fn new(serializer: Arc<JwtSerializer>, registry: Arc<RevocationRegistry>) -> Self {
        TokenVerifier {
            serializer,
            registry,
        }
    }

    /// Verify `token` as `class` and return its claims.
    pub fn verify(&self, token: &str, class: TokenClass) -> Result<Claims, TokenError> {
        let result = self.check(token, class, chrono::Utc::now().timestamp());

        let outcome = match &result {
            Ok(_) => "valid",
            Err(err) => {
                debug!(
                    token_type = %class,
                    token_fp = %RefreshTokenGenerator::log_id(token),
                    reason = err.code(),
                    "Token verification failed"
                );
                err.code()
            }
        };
        metrics::VERIFICATIONS
            .with_label_values(&[class.as_str(), outcome])
            .inc();

        result
    }

    fn check(&self, token: &str, class: TokenClass, now: i64) -> Result<Claims, TokenError> {
        let claims = match self.serializer.deserialize(token, class) {
            Ok(claims) => claims,
            Err(TokenError::SignatureInvalid) => {
                return Err(self.classify_signature_failure(token, class));
            }
            Err(err) => return Err(err),
        };

        if claims.class() != Some(class) {
            return Err(TokenError::WrongType);
        }
        claims.require_shape(class)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        if class == TokenClass::Refresh {
            // require_shape guarantees the family is present
            let family_id = claims.token_family.as_deref().unwrap_or_default();
            if self.registry.is_revoked(token, family_id) {
                return Err(TokenError::Blacklisted);
            }
        }

        Ok(claims)
    }

    /// Family of a correctly signed refresh token that has already been
    /// consumed. `None` for anything else, including tokens rejected only
    /// because their family is revoked.
    pub fn family_of_consumed(&self, token: &str) -> Option<String> {
        let claims = self.serializer.deserialize(token, TokenClass::Refresh).ok()?;
        if !self.registry.is_token_blacklisted(token) {
            return None;
        }
        claims.token_family
    }

    /// A genuine token of the other class fails the signature check because
    /// each class has its own secret. Report it as a type mismatch.
    fn classify_signature_failure(&self, token: &str, class: TokenClass) -> TokenError {
        let other = class.other();
        match self.serializer.deserialize(token, other) {
            Ok(claims) if claims.class() == Some(other) => TokenError::WrongType,
            _ => TokenError::SignatureInvalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::jwt::claims::Identity;

    const ACCESS: &str = "access-secret-for-verifier-tests-00000";
    const REFRESH: &str = "refresh-secret-for-verifier-tests-00000";

    fn verifier() -> (TokenVerifier, Arc<JwtSerializer>, Arc<RevocationRegistry>) {
        let serializer = Arc::new(JwtSerializer::new(&TokenConfig::new(ACCESS, REFRESH)));
        let registry = Arc::new(RevocationRegistry::new());
        (
            TokenVerifier::new(serializer.clone(), registry.clone()),
            serializer,
            registry,
        )
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_valid_tokens() {
        let (verifier, serializer, _) = verifier();
        let access = serializer
            .serialize(&Claims::access(&Identity::new("U1", "u1@example.com"), now(), 600), TokenClass::Access)
            .unwrap();
        let refresh = serializer
            .serialize(&Claims::refresh("U1", "family-1", now(), 6000), TokenClass::Refresh)
            .unwrap();

        assert_eq!(verifier.verify(&access, TokenClass::Access).unwrap().sub, "U1");
        assert_eq!(verifier.verify(&refresh, TokenClass::Refresh).unwrap().sub, "U1");
    }

    #[test]
    fn test_cross_class_is_wrong_type() {
        let (verifier, serializer, _) = verifier();
        let access = serializer
            .serialize(&Claims::access(&Identity::new("U1", "u1@example.com"), now(), 600), TokenClass::Access)
            .unwrap();
        let refresh = serializer
            .serialize(&Claims::refresh("U1", "family-1", now(), 6000), TokenClass::Refresh)
            .unwrap();

        assert_eq!(verifier.verify(&access, TokenClass::Refresh), Err(TokenError::WrongType));
        assert_eq!(verifier.verify(&refresh, TokenClass::Access), Err(TokenError::WrongType));
    }

    #[test]
    fn test_type_claim_mismatch_under_right_secret() {
        let (verifier, serializer, _) = verifier();
        // Refresh-shaped claims signed with the access secret
        let token = serializer
            .serialize(&Claims::refresh("U1", "family-1", now(), 6000), TokenClass::Access)
            .unwrap();

        assert_eq!(verifier.verify(&token, TokenClass::Access), Err(TokenError::WrongType));
    }

    #[test]
    fn test_foreign_signature() {
        let (verifier, _, _) = verifier();
        let foreign = JwtSerializer::new(&TokenConfig::new(
            "some-other-access-secret-0000000000000",
            "some-other-refresh-secret-000000000000",
        ));
        let token = foreign
            .serialize(&Claims::refresh("U1", "family-1", now(), 6000), TokenClass::Refresh)
            .unwrap();

        assert_eq!(
            verifier.verify(&token, TokenClass::Refresh),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_expired_wins_over_blacklist() {
        let (verifier, serializer, registry) = verifier();
        let token = serializer
            .serialize(&Claims::refresh("U1", "family-1", now() - 120, 60), TokenClass::Refresh)
            .unwrap();

        assert_eq!(verifier.verify(&token, TokenClass::Refresh), Err(TokenError::Expired));
        registry.blacklist_token(&token);
        assert_eq!(verifier.verify(&token, TokenClass::Refresh), Err(TokenError::Expired));
    }

    #[test]
    fn test_blacklisted_token_and_family() {
        let (verifier, serializer, registry) = verifier();
        let a = serializer
            .serialize(&Claims::refresh("U1", "family-1", now(), 6000), TokenClass::Refresh)
            .unwrap();
        let b = serializer
            .serialize(&Claims::refresh("U1", "family-2", now(), 6000), TokenClass::Refresh)
            .unwrap();

        registry.blacklist_token(&a);
        registry.blacklist_family("family-2");

        assert_eq!(verifier.verify(&a, TokenClass::Refresh), Err(TokenError::Blacklisted));
        assert_eq!(verifier.verify(&b, TokenClass::Refresh), Err(TokenError::Blacklisted));
    }

    #[test]
    fn test_access_ignores_registry() {
        let (verifier, serializer, registry) = verifier();
        let access = serializer
            .serialize(&Claims::access(&Identity::new("U1", "u1@example.com"), now(), 600), TokenClass::Access)
            .unwrap();

        registry.blacklist_token(&access);
        assert!(verifier.verify(&access, TokenClass::Access).is_ok());
    }

    #[test]
    fn test_missing_claims_are_malformed() {
        let (verifier, serializer, _) = verifier();
        let mut claims = Claims::refresh("U1", "family-1", now(), 6000);
        claims.token_family = None;
        let token = serializer.serialize(&claims, TokenClass::Refresh).unwrap();

        assert_eq!(verifier.verify(&token, TokenClass::Refresh), Err(TokenError::Malformed));
        assert_eq!(verifier.verify("", TokenClass::Refresh), Err(TokenError::Malformed));
    }
}
