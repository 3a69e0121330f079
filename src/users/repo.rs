use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::repo_types::{NewUser, ProfileChanges, User};

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence for user records. Each call is one unit of work.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn insert(&self, user: NewUser) -> Result<User, InsertError>;
    /// Overwrites the mutable fields; `None` if `id` does not exist.
    async fn update_profile(&self, id: i64, changes: ProfileChanges)
        -> anyhow::Result<Option<User>>;
    /// `false` if `id` does not exist.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, hashed_password, bio, avatar_url
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, hashed_password, bio, avatar_url
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, InsertError> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, hashed_password, bio, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, name, hashed_password, bio, avatar_url
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.hashed_password)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(u) => Ok(u),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(InsertError::DuplicateEmail)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn update_profile(
        &self,
        id: i64,
        changes: ProfileChanges,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name = $2, bio = $3, avatar_url = $4
             WHERE id = $1
            RETURNING id, email, name, hashed_password, bio, avatar_url
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.bio)
        .bind(&changes.avatar_url)
        .fetch_optional(&self.db)
        .await
        .context("update user profile")?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }
}
