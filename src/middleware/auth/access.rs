//! 保護ルートの認可 middleware
//!
//! - bearer token と API key をリクエストから取り出す (transport はここの責務)
//! - RequestAuthorizer の判定を HTTP に写像する: Authorized → next, Unauthorized → 401, SystemError → 500
//! - 成功時は AuthCtx を extensions に入れる

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Cookie set by the platform's login handler.
pub const AUTH_COOKIE: &str = "auth_token";
pub const API_KEY_HEADER: &str = "x-api-key";

/// 保護したい Router に認可を掛ける。
///
/// 例：
/// ```ignore
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Missing credentials are passed through as empty strings and fail in pipeline order.
    let token = bearer_token(req.headers()).unwrap_or_default();
    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let identity = state
        .authorizer
        .authorize(token, api_key)
        .await
        .into_result()?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(identity.username));

    Ok(next.run(req).await)
}

/// `Authorization: Bearer <token>` first, then the `auth_token` cookie.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    from_header.or_else(|| cookie_value(headers, AUTH_COOKIE))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}
