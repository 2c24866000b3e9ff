/*
 * Responsibility
 * - ユーザー永続化の capability (UserStore) を定義する
 * - handler / service はこの trait だけに依存し、PG 実装と in-memory 実装を差し替えられる
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repos::error::RepoResult;
use crate::services::auth::Role;

/// Persisted user record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    #[sqlx(rename = "userId")]
    pub id: Uuid,
    pub email: String,
    #[sqlx(rename = "passwordHash")]
    pub password_hash: String,
    pub role: Role,
    // Reserved for the password-reset flow, which is not implemented.
    #[sqlx(rename = "resetToken")]
    pub reset_token: Option<String>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[sqlx(rename = "deletedAt")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert shape for `UserStore::create_user`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// The slice of user persistence the auth endpoints need.
///
/// Every method is a plain future: dropping it (client disconnect, request
/// timeout) cancels the in-flight call.
///
/// - `user_by_id` / `user_by_email` return `RepoError::NotFound` on a miss
///   and never return soft-deleted users
/// - `create_user` returns `RepoError::Conflict` when the email is taken
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user_count(&self) -> RepoResult<i64>;

    async fn user_by_id(&self, id: Uuid) -> RepoResult<User>;

    async fn user_by_email(&self, email: &str) -> RepoResult<User>;

    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
}
