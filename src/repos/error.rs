/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

use crate::services::auth::LookupError;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
}

impl From<RepoError> for LookupError {
    fn from(e: RepoError) -> Self {
        LookupError::new(e)
    }
}
