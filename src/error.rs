//! Error taxonomy for token verification, rotation and configuration.

use thiserror::Error;

/// Message surfaced to callers for every authentication failure.
pub const AUTHENTICATION_DENIED: &str = "authentication denied";

/// Token lifecycle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Undecodable token, unexpected algorithm or missing claims
    #[error("Token malformed")]
    Malformed,

    /// Signature does not verify under either secret
    #[error("Token signature invalid")]
    SignatureInvalid,

    /// `exp` is in the past
    #[error("Token expired")]
    Expired,

    /// `token_type` absent or naming the other class
    #[error("Token type does not match the requested class")]
    WrongType,

    /// Refresh token consumed or its family revoked
    #[error("Token revoked")]
    Blacklisted,

    /// No email could be resolved for the subject during rotation
    #[error("Identity lookup unavailable for subject")]
    IdentityUnavailable,

    /// Rejected configuration
    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(String),

    /// Signing or key failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TokenError {
    /// Build a `ConfigurationInvalid` error.
    pub fn config(msg: impl Into<String>) -> Self {
        TokenError::ConfigurationInvalid(msg.into())
    }

    /// Build an `Internal` error.
    pub fn internal(msg: impl Into<String>) -> Self {
        TokenError::Internal(msg.into())
    }

    /// Stable code used for log fields and metric labels.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => TOKEN_MALFORMED,
            TokenError::SignatureInvalid => TOKEN_SIGNATURE_INVALID,
            TokenError::Expired => TOKEN_EXPIRED,
            TokenError::WrongType => TOKEN_WRONG_TYPE,
            TokenError::Blacklisted => TOKEN_BLACKLISTED,
            TokenError::IdentityUnavailable => TOKEN_IDENTITY_UNAVAILABLE,
            TokenError::ConfigurationInvalid(_) => TOKEN_CONFIGURATION_INVALID,
            TokenError::Internal(_) => TOKEN_INTERNAL,
        }
    }

    /// True for failures that callers must present as a denied authentication.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            TokenError::Malformed
                | TokenError::SignatureInvalid
                | TokenError::Expired
                | TokenError::WrongType
                | TokenError::Blacklisted
                | TokenError::IdentityUnavailable
        )
    }

    /// The only text that may leave the process for this error.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        if self.is_auth_failure() {
            AUTHENTICATION_DENIED
        } else {
            "internal error"
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) => {
                TokenError::internal("signing key rejected")
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Error code for [`TokenError::Malformed`].
pub const TOKEN_MALFORMED: &str = "TOKEN_MALFORMED";
/// Error code for [`TokenError::SignatureInvalid`].
pub const TOKEN_SIGNATURE_INVALID: &str = "TOKEN_SIGNATURE_INVALID";
/// Error code for [`TokenError::Expired`].
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
/// Error code for [`TokenError::WrongType`].
pub const TOKEN_WRONG_TYPE: &str = "TOKEN_WRONG_TYPE";
/// Error code for [`TokenError::Blacklisted`].
pub const TOKEN_BLACKLISTED: &str = "TOKEN_BLACKLISTED";
/// Error code for [`TokenError::IdentityUnavailable`].
pub const TOKEN_IDENTITY_UNAVAILABLE: &str = "TOKEN_IDENTITY_UNAVAILABLE";
/// Error code for [`TokenError::ConfigurationInvalid`].
pub const TOKEN_CONFIGURATION_INVALID: &str = "TOKEN_CONFIGURATION_INVALID";
/// Error code for [`TokenError::Internal`].
pub const TOKEN_INTERNAL: &str = "TOKEN_INTERNAL";
