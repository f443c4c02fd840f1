//! Confirms that the subject named by a verified token still exists.
use std::{error::Error as StdError, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::services::auth::token_codec::ClaimSet;

/// User store failure (transport, pool, query).
///
/// Kept distinct from "not found" so callers can treat it as a system fault.
#[derive(Debug, Error)]
#[error("user lookup failed: {0}")]
pub struct LookupError(#[source] Box<dyn StdError + Send + Sync + 'static>);

impl LookupError {
    pub fn new(e: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self(e.into())
    }
}

/// Existence lookup by username.
///
/// Returns:
/// - `Ok(true)`  => user exists
/// - `Ok(false)` => no such user
/// - `Err(_)`    => backend failure
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, username: &str) -> Result<bool, LookupError>;
}

/// Existence-confirmed identity. No attributes are hydrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("missing 'username' claim")]
    MissingUsernameClaim,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

#[derive(Clone)]
pub struct IdentityResolver {
    directory: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// One lookup per call. No caching, no retry.
    pub async fn resolve(&self, claims: &ClaimSet) -> Result<Identity, IdentityError> {
        let username = claims
            .username()
            .filter(|u| !u.trim().is_empty())
            .ok_or(IdentityError::MissingUsernameClaim)?;

        if self.directory.user_exists(username).await? {
            Ok(Identity {
                username: username.to_owned(),
            })
        } else {
            Err(IdentityError::UserNotFound)
        }
    }
}
