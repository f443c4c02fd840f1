/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は公開、それ以外は access middleware で保護する
 */
use axum::{Router, routing::get};

use crate::middleware::auth::access;
use crate::state::AppState;

use crate::api::v1::handlers::{health::health, session::current_session};

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health));

    let protected = Router::new().route("/session", get(current_session));
    let protected = access::apply(protected, state);

    public.merge(protected)
}
