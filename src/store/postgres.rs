use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{Store, StoreError, UniqueField};
use crate::auth::repo_types::{NewUser, User};
use crate::chats::repo_types::{Chat, NewChat};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

fn map_insert_user_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => StoreError::Conflict(UniqueField::Email),
                _ => StoreError::Conflict(UniqueField::Username),
            };
        }
    }
    StoreError::Other(anyhow::Error::new(e).context("insert user"))
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, is_active
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

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, created_at, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, username, email, password_hash, created_at, is_active
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_user_error)
    }

    async fn insert_chat(&self, new: NewChat) -> Result<Chat, StoreError> {
        let chat = sqlx::query_as::<_, Chat>(
            r#"
            INSERT INTO chats (user_id, message, response, "timestamp")
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, message, response, "timestamp"
            "#,
        )
        .bind(new.user_id)
        .bind(&new.message)
        .bind(&new.response)
        .bind(new.timestamp)
        .fetch_one(&self.db)
        .await
        .context("insert chat")?;
        Ok(chat)
    }

    async fn recent_chats(&self, user_id: Uuid, limit: i64) -> Result<Vec<Chat>, StoreError> {
        let rows = sqlx::query_as::<_, Chat>(
            r#"
            SELECT id, user_id, message, response, "timestamp"
            FROM chats
            WHERE user_id = $1
            ORDER BY "timestamp" DESC, seq DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("list recent chats")?;
        Ok(rows)
    }
}
