use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::chats::repo_types::{Chat, NewChat};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Column carrying a uniqueness constraint on users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn label(self) -> &'static str {
        match self {
            UniqueField::Username => "Username",
            UniqueField::Email => "Email",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{} already registered", .0.label())]
    Conflict(UniqueField),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence for users and chat turns.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when username or email is taken.
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn insert_chat(&self, new: NewChat) -> Result<Chat, StoreError>;

    /// Newest first, at most `limit` rows.
    async fn recent_chats(&self, user_id: Uuid, limit: i64) -> Result<Vec<Chat>, StoreError>;
}
