/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - NotFound / Conflict は呼び出し側で HTTP の意味に変換される
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("user with email {email:?} already exists")]
    Conflict { email: String },
    #[error("db error")]
    Db(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

const UNIQUE_VIOLATION: &str = "23505";

impl RepoError {
    /// Turn a unique violation on insert into `Conflict`, everything else into `Db`.
    pub fn from_insert(e: sqlx::Error, email: &str) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some(UNIQUE_VIOLATION)
        {
            return RepoError::Conflict {
                email: email.to_string(),
            };
        }
        RepoError::Db(e)
    }
}
