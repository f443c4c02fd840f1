//! Shared-secret API key check.
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    #[error("backend API secret is not configured")]
    NotConfigured,
}

/// Holds the process-wide API secret.
///
/// `Debug` prints `[REDACTED]` via `SecretString`.
#[derive(Debug)]
pub struct SharedSecretCheck {
    secret: SecretString,
}

impl SharedSecretCheck {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }

    /// - `Ok(true)`  => key matches
    /// - `Ok(false)` => mismatch
    /// - `Err(NotConfigured)` => empty secret, for every input
    pub fn check(&self, supplied: &str) -> Result<bool, SecretError> {
        let expected = self.secret.expose_secret();
        if expected.is_empty() {
            return Err(SecretError::NotConfigured);
        }

        // Unequal lengths compare as false without early exit.
        Ok(expected.as_bytes().ct_eq(supplied.as_bytes()).into())
    }
}
