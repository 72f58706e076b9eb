//! Refresh token identifiers and single-use rotation.

pub mod generator;
pub mod rotator;

pub use generator::RefreshTokenGenerator;
pub use rotator::RefreshTokenRotator;
