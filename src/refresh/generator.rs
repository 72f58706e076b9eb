//! Family ids and token fingerprints.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

/// Identifiers and fingerprints for refresh tokens.
pub struct RefreshTokenGenerator;

impl RefreshTokenGenerator {
    /// Fresh random family id.
    pub fn generate_family_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// SHA-256 of the token string, URL-safe base64 without padding.
    pub fn fingerprint(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        URL_SAFE_NO_PAD.encode(result)
    }

    /// Short prefix of the fingerprint, safe to put in logs.
    pub fn log_id(token: &str) -> String {
        let mut fp = Self::fingerprint(token);
        fp.truncate(12);
        fp
    }
}
