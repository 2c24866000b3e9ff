//! In-process `UserStore`, used by tests and local runs without PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_store::{NewUser, User, UserStore};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn user_count(&self) -> RepoResult<i64> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn user_by_id(&self, id: Uuid) -> RepoResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn user_by_email(&self, email: &str) -> RepoResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut users = self.users.write().await;

        // Same rule as the unique index on users.email.
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict { email: user.email });
        }

        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            reset_token: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(row.clone());

        Ok(row)
    }
}
