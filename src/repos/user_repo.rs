/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (存在確認のみ)
 * - PgPool を受け取り、認可パイプラインの UserDirectory を実装する
 * - DB エラーは RepoError → LookupError に変換して返す
 */
use async_trait::async_trait;
use sqlx::PgPool;

use crate::repos::error::RepoError;
use crate::services::auth::{LookupError, UserDirectory};

pub async fn exists_by_username(db: &PgPool, user_name: &str) -> Result<bool, RepoError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM users
            WHERE "userName" = $1
        )
        "#,
    )
    .bind(user_name)
    .fetch_one(db)
    .await?;

    Ok(exists)
}

/// Postgres-backed user directory.
///
/// Pool sizing and acquire timeouts are the pool's concern; a failure here is
/// returned once, without retry.
#[derive(Clone, Debug)]
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn user_exists(&self, username: &str) -> Result<bool, LookupError> {
        Ok(exists_by_username(&self.db, username).await?)
    }
}
