//! Identity lookup used during rotation.
//!
//! Refresh tokens carry no email, so rotation asks the user store for the
//! subject's current address before minting the new access token.

use crate::error::TokenError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

/// Resolves a subject id to its current email.
pub trait IdentityDirectory: Send + Sync {
    /// `Ok(None)` when the subject is unknown.
    fn lookup_email(
        &self,
        subject: &str,
    ) -> impl Future<Output = Result<Option<String>, TokenError>> + Send;
}

/// In-memory directory for tests and local development.
#[derive(Default)]
pub struct InMemoryDirectory {
    emails: RwLock<HashMap<String, String>>,
}

impl InMemoryDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a subject.
    #[must_use]
    pub fn with_user(self, subject: impl Into<String>, email: impl Into<String>) -> Self {
        self.insert(subject, email);
        self
    }

    /// Add or replace a subject in place.
    pub fn insert(&self, subject: impl Into<String>, email: impl Into<String>) {
        self.emails
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject.into(), email.into());
    }

    /// Forget a subject; later rotations for it fail the lookup.
    pub fn remove(&self, subject: &str) {
        self.emails
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(subject);
    }
}

impl IdentityDirectory for InMemoryDirectory {
    async fn lookup_email(&self, subject: &str) -> Result<Option<String>, TokenError> {
        Ok(self
            .emails
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .cloned())
    }
}
