//! Ephemeral user repository, used when the relational store is unavailable.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use notevault_core::{Error, Result, User, UserRepository};

/// Map-backed user repository keyed by uid. Nothing is persisted.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<String, User>, email: &str, except_uid: Option<&str>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.uid.as_str()) != except_uid)
}

fn user_not_found(key: &str) -> Error {
    Error::NotFound(format!("User {} not found", key))
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn save(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, None) || users.contains_key(&user.uid) {
            return Err(Error::AlreadyExists(format!("user '{}'", user.email)));
        }
        debug!(subsystem = "store", component = "users", op = "save", uid = %user.uid, "User saved");
        users.insert(user.uid.clone(), user);
        Ok(())
    }

    async fn get_by_login(&self, email: &str) -> Result<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| user_not_found(email))
    }

    async fn get_by_id(&self, uid: &str) -> Result<User> {
        self.users
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| user_not_found(uid))
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        if users.is_empty() {
            return Err(Error::NoneAvailable("users".to_string()));
        }
        let mut list: Vec<User> = users.values().cloned().collect();
        list.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(list)
    }

    async fn update_by_id(&self, uid: &str, mut user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(uid) {
            return Err(user_not_found(uid));
        }
        if email_taken(&users, &user.email, Some(uid)) {
            return Err(Error::AlreadyExists(format!("user '{}'", user.email)));
        }
        user.uid = uid.to_string();
        users.insert(uid.to_string(), user);
        Ok(())
    }

    async fn delete_by_id(&self, uid: &str) -> Result<()> {
        self.users
            .write()
            .await
            .remove(uid)
            .map(|_| ())
            .ok_or_else(|| user_not_found(uid))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
