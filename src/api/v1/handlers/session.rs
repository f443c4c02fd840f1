/*
 * Responsibility
 * - GET /session (認可済みの呼び出し元を返す)
 * - 保護ルートが AuthCtx をどう受け取るかの最小例
 */
use axum::Json;
use serde::Serialize;

use crate::api::v1::extractors::AuthCtxExtractor;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: String,
}

pub async fn current_session(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<SessionResponse> {
    Json(SessionResponse {
        username: ctx.username,
    })
}
