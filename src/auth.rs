//! Credential gate
//!
//! One-shot admission check run before a session reaches the store. The
//! server-held secret is loaded from a file at startup; each session must
//! present the full secret on one line.
//!
//! Comparison is exact and constant-time: a supplied credential matches only
//! when it has the secret's exact length and every byte agrees. Prefix or
//! empty submissions are rejected.

use std::fs;
use std::path::Path;

use subtle::ConstantTimeEq;

use crate::error::{NotekeepError, Result};

/// Validates client credentials against the server secret
pub struct CredentialGate {
    secret: Vec<u8>,
}

impl CredentialGate {
    /// Load the secret from a file.
    ///
    /// A single trailing newline is trimmed so `echo secret > file` works.
    /// An unreadable or empty file is a startup failure, not something to
    /// limp past.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|e| {
            NotekeepError::Config(format!("cannot read credential file {}: {e}", path.display()))
        })?;

        let mut secret = raw;
        if secret.last() == Some(&b'\n') {
            secret.pop();
            if secret.last() == Some(&b'\r') {
                secret.pop();
            }
        }

        if secret.is_empty() {
            return Err(NotekeepError::Config(format!(
                "credential file {} is empty",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "credential secret loaded");
        Ok(Self { secret })
    }

    /// Build a gate from an in-memory secret (tests, embedding)
    pub fn from_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check a client-supplied credential. Full-length match only.
    pub fn verify(&self, supplied: &[u8]) -> bool {
        if supplied.len() != self.secret.len() {
            return false;
        }
        self.secret.ct_eq(supplied).into()
    }
}

impl std::fmt::Debug for CredentialGate {
    // Never expose the secret through Debug output
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGate").finish_non_exhaustive()
    }
}
