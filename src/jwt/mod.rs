//! JWT claims, signing, issuance and verification.

pub mod claims;
pub mod issuer;
pub mod serializer;
pub mod verifier;

pub use claims::{Claims, Identity, TokenClass};
pub use issuer::{TokenIssuer, TokenPair};
pub use serializer::JwtSerializer;
pub use verifier::TokenVerifier;
