//! HMAC encoding and decoding with per-class keys.

use crate::config::{JwtAlgorithm, TokenConfig};
use crate::error::TokenError;
use crate::jwt::claims::{Claims, TokenClass};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;

struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl ClassKeys {
    fn from_secret(secret: &[u8]) -> Self {
        ClassKeys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Signs and decodes tokens of both classes.
///
/// Decoding checks the signature and header algorithm only; expiry is
/// left to the caller so that the verifier controls check ordering and
/// the metadata utility can read expired tokens.
pub struct JwtSerializer {
    algorithm: JwtAlgorithm,
    access: ClassKeys,
    refresh: ClassKeys,
}

impl JwtSerializer {
    /// Derive both key pairs from `config`.
    pub fn new(config: &TokenConfig) -> Self {
        JwtSerializer {
            algorithm: config.algorithm,
            access: ClassKeys::from_secret(config.access_secret.expose_secret().as_bytes()),
            refresh: ClassKeys::from_secret(config.refresh_secret.expose_secret().as_bytes()),
        }
    }

    fn keys(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    /// Configured signing algorithm.
    pub fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    /// Sign `claims` with the secret of `class`.
    pub fn serialize(&self, claims: &Claims, class: TokenClass) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm.to_jwt());
        encode(&header, claims, &self.keys(class).encoding)
            .map_err(|_| TokenError::internal("JWT encoding failed"))
    }

    /// Decode `token` with the secret of `class` without enforcing expiry.
    pub fn deserialize(&self, token: &str, class: TokenClass) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm.to_jwt());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.keys(class).decoding, &validation)?;
        Ok(token_data.claims)
    }

    /// Read the payload without any signature check.
    ///
    /// Only for bookkeeping (e.g. learning a token's `exp`), never for
    /// authorization.
    pub fn peek_unverified(token: &str) -> Result<Claims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(TokenError::Malformed);
        }

        let payload = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            parts[1],
        )
        .map_err(|_| TokenError::Malformed)?;

        serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)
    }
}
