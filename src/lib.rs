//! Token lifecycle core for the SetLogger backend.
//!
//! Issues access/refresh pairs for verified identities, rotates refresh
//! tokens exactly once, revokes individual tokens and whole families, and
//! offers non-authoritative expiry introspection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bearer;
pub mod config;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod metadata;
pub mod metrics;
pub mod refresh;
pub mod service;
pub mod storage;
pub mod telemetry;

// Re-exports for convenience
pub use bearer::extract_bearer;
pub use config::{JwtAlgorithm, RotationPolicy, TokenConfig};
pub use error::TokenError;
pub use identity::{IdentityDirectory, InMemoryDirectory};
pub use jwt::{Claims, Identity, TokenClass, TokenPair};
pub use metadata::TokenMetadata;
pub use service::TokenService;
pub use storage::{ConsumeOutcome, RevocationRegistry};
