//! Request authorization: token → identity → shared secret.
//!
//! The pipeline is linear and fails fast. The decision keeps the reason of the
//! earliest failing layer; collapse to a boolean only at the HTTP boundary.
use std::fmt;

use tracing::{debug, error, warn};

use crate::services::auth::{
    identity::{Identity, IdentityError, IdentityResolver, LookupError},
    shared_secret::{SecretError, SharedSecretCheck},
    token_codec::{TokenCodec, TokenError},
};

/// Pipeline stage that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLayer {
    Token,
    Identity,
    Secret,
}

impl AuthLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Identity => "identity",
            Self::Secret => "secret",
        }
    }
}

impl fmt::Display for AuthLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-fault reasons (→ 401).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Token(TokenError),
    MissingUsernameClaim,
    UserNotFound,
    SecretMismatch,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Token(e) => e.code(),
            Self::MissingUsernameClaim => "missing_username_claim",
            Self::UserNotFound => "user_not_found",
            Self::SecretMismatch => "secret_mismatch",
        }
    }

    pub fn layer(&self) -> AuthLayer {
        match self {
            Self::Token(_) => AuthLayer::Token,
            Self::MissingUsernameClaim | Self::UserNotFound => AuthLayer::Identity,
            Self::SecretMismatch => AuthLayer::Secret,
        }
    }
}

/// Operator-fault reasons (→ 500).
#[derive(Debug)]
pub enum SystemFault {
    Lookup(LookupError),
    SecretNotConfigured,
}

impl SystemFault {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lookup(_) => "lookup_error",
            Self::SecretNotConfigured => "secret_not_configured",
        }
    }

    pub fn layer(&self) -> AuthLayer {
        match self {
            Self::Lookup(_) => AuthLayer::Identity,
            Self::SecretNotConfigured => AuthLayer::Secret,
        }
    }
}

#[derive(Debug)]
pub enum AuthorizationDecision {
    Authorized(Identity),
    Unauthorized(DenialReason),
    SystemError(SystemFault),
}

impl AuthorizationDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

impl From<IdentityError> for AuthorizationDecision {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::MissingUsernameClaim => {
                Self::Unauthorized(DenialReason::MissingUsernameClaim)
            }
            IdentityError::UserNotFound => Self::Unauthorized(DenialReason::UserNotFound),
            IdentityError::Lookup(e) => Self::SystemError(SystemFault::Lookup(e)),
        }
    }
}

impl From<SecretError> for AuthorizationDecision {
    fn from(e: SecretError) -> Self {
        match e {
            SecretError::NotConfigured => Self::SystemError(SystemFault::SecretNotConfigured),
        }
    }
}

#[derive(Debug)]
pub struct RequestAuthorizer {
    codec: TokenCodec,
    identity: IdentityResolver,
    secret: SharedSecretCheck,
}

impl RequestAuthorizer {
    pub fn new(codec: TokenCodec, identity: IdentityResolver, secret: SharedSecretCheck) -> Self {
        Self {
            codec,
            identity,
            secret,
        }
    }

    pub async fn authorize(&self, token: &str, api_key: &str) -> AuthorizationDecision {
        let decision = self.decide(token, api_key).await;
        log_decision(&decision);
        decision
    }

    async fn decide(&self, token: &str, api_key: &str) -> AuthorizationDecision {
        let claims = match self.codec.verify(token) {
            Ok(claims) => claims,
            Err(e) => return AuthorizationDecision::Unauthorized(DenialReason::Token(e)),
        };

        let identity = match self.identity.resolve(&claims).await {
            Ok(identity) => identity,
            Err(e) => return e.into(),
        };

        match self.secret.check(api_key) {
            Ok(true) => AuthorizationDecision::Authorized(identity),
            Ok(false) => AuthorizationDecision::Unauthorized(DenialReason::SecretMismatch),
            Err(e) => e.into(),
        }
    }
}

fn log_decision(decision: &AuthorizationDecision) {
    match decision {
        AuthorizationDecision::Authorized(identity) => {
            debug!(username = %identity.username, "request authorized");
        }
        AuthorizationDecision::Unauthorized(reason) => {
            warn!(
                layer = %reason.layer(),
                reason = reason.code(),
                "request denied"
            );
        }
        AuthorizationDecision::SystemError(SystemFault::Lookup(e)) => {
            error!(layer = "identity", reason = "lookup_error", error = %e, "authorization system fault");
        }
        AuthorizationDecision::SystemError(fault) => {
            error!(
                layer = %fault.layer(),
                reason = fault.code(),
                "authorization system fault"
            );
        }
    }
}
