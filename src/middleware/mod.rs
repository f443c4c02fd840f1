/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 保護ルートの認可, http: request-id / trace / limit / timeout
 */
pub mod auth;
pub mod http;
