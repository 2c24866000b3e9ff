/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (UserStore の PostgreSQL 実装)
 * - 論理削除 ("deletedAt" IS NOT NULL) のユーザーは検索対象外
 * - DB エラーは RepoError に変換して返す
 */
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_store::{NewUser, User, UserStore};

const USER_COLUMNS: &str = r#"
    "userId", email, "passwordHash", role, "resetToken",
    "createdAt", "updatedAt", "deletedAt"
"#;

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(name = "db.user_count", skip(self), err(level = "debug"))]
    async fn user_count(&self) -> RepoResult<i64> {
        // Soft-deleted rows still count: bootstrap happens once per database.
        let count: i64 = sqlx::query_scalar(r#"SELECT count(*) FROM users"#)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    #[instrument(name = "db.user_by_id", skip(self), err(level = "debug"))]
    async fn user_by_id(&self, id: Uuid) -> RepoResult<User> {
        let sql = format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE "userId" = $1 AND "deletedAt" IS NULL"#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound)
    }

    #[instrument(name = "db.user_by_email", skip(self), err(level = "debug"))]
    async fn user_by_email(&self, email: &str) -> RepoResult<User> {
        let sql = format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND "deletedAt" IS NULL"#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound)
    }

    #[instrument(name = "db.create_user", skip(self, user), fields(email = %user.email), err)]
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (email, "passwordHash", role)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::from_insert(e, &user.email))
    }
}
