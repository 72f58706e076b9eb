//! Revocation state.

pub mod registry;

pub use registry::{ConsumeOutcome, RegistryStats, RevocationRegistry};
