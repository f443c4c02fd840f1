/*
 * Responsibility
 * - Handler から見える「認可済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - token / user 存在確認 / API key の検証は middleware/services 側の責務
 */

/// 認可済みのリクエストに付与されるコンテキスト
///
/// - `username` は user store で存在確認済み
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub username: String,
}

impl AuthCtx {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
