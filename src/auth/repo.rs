use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    db::is_unique_violation,
    error::AppError,
};

/// Credential store: user records keyed by id, unique by username.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`AppError::DuplicateUsername`] when the name is taken.
    async fn register(&self, user: NewUser) -> Result<Uuid, AppError>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str =
    "id, username, password_hash, name, age, gender, dob, profile_picture, created_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn register(&self, user: NewUser) -> Result<Uuid, AppError> {
        let res = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, password_hash, name, age, gender, dob, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.age)
        .bind(&user.gender)
        .bind(user.dob)
        .bind(&user.profile_picture)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(id) => Ok(id),
            Err(e) if is_unique_violation(&e) => {
                warn!(username = %user.username, "username taken at insert");
                Err(AppError::DuplicateUsername)
            }
            Err(e) => Err(AppError::Internal(anyhow::Error::new(e).context("insert user"))),
        }
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }
}
