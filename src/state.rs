/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - authorizer: RequestAuthorizer (内部に TokenCodec / UserDirectory / secret)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::RequestAuthorizer;

#[derive(Clone, Debug)]
pub struct AppState {
    pub authorizer: Arc<RequestAuthorizer>,
}

impl AppState {
    pub fn new(authorizer: Arc<RequestAuthorizer>) -> Self {
        Self { authorizer }
    }
}
