use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{Store, StoreError, UniqueField};
use crate::auth::repo_types::{NewUser, User};
use crate::chats::repo_types::{Chat, NewChat};

/// In-process store for handler tests.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    chats: Mutex<Vec<Chat>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_count(&self) -> usize {
        self.chats.lock().unwrap().len()
    }

    pub fn deactivate(&self, username: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.username == username) {
            u.is_active = false;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: new.created_at,
            is_active: true,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn insert_chat(&self, new: NewChat) -> Result<Chat, StoreError> {
        let chat = Chat {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            message: new.message,
            response: new.response,
            // timestamptz keeps microseconds
            timestamp: new
                .timestamp
                .replace_microsecond(new.timestamp.microsecond())
                .unwrap(),
        };
        self.chats.lock().unwrap().push(chat.clone());
        Ok(chat)
    }

    async fn recent_chats(&self, user_id: Uuid, limit: i64) -> Result<Vec<Chat>, StoreError> {
        let chats = self.chats.lock().unwrap();
        // later inserts win ties on equal timestamps
        let mut rows: Vec<Chat> = chats
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}
