/// Factory: build `RequestAuthorizer` from `AuthConfig` and a user directory.
use std::sync::Arc;

use tracing::error;

use crate::config::AuthConfig;
use crate::services::auth::{
    RequestAuthorizer, UserDirectory, identity::IdentityResolver,
    shared_secret::SharedSecretCheck, token_codec::TokenCodec,
};

pub fn build_authorizer(
    config: AuthConfig,
    directory: Arc<dyn UserDirectory>,
) -> Arc<RequestAuthorizer> {
    let codec = TokenCodec::new(&config);
    let secret = SharedSecretCheck::new(config.api_secret);

    // Not fatal: the server still starts, and every protected request fails with 500.
    if !secret.is_configured() {
        error!("BACKEND_API_SECRET is not set; all protected requests will be rejected");
    }

    Arc::new(RequestAuthorizer::new(
        codec,
        IdentityResolver::new(directory),
        secret,
    ))
}
