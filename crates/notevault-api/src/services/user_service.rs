//! User registration, login and profile management over a [`UserRepository`].

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use notevault_core::password::{hash_password, verify_password};
use notevault_core::{Error, LoginRequest, RegisterUserRequest, Result, User, UserRepository};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, stored: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| Error::Internal(format!("password verification task failed: {}", e)))
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Register a user, returning the generated uid.
    pub async fn register(&self, req: RegisterUserRequest) -> Result<String> {
        let uid = Uuid::new_v4().to_string();
        let user = User {
            uid: uid.clone(),
            name: req.name,
            email: req.email,
            password: hash_blocking(req.password).await?,
        };
        self.repo.save(user).await?;
        debug!(subsystem = "api", component = "user_service", op = "register", uid = %uid, "User registered");
        Ok(uid)
    }

    /// Check credentials, returning the user's uid.
    ///
    /// An unknown email surfaces as `NotFound`; a wrong password as
    /// `InvalidCredentials`.
    pub async fn login(&self, req: LoginRequest) -> Result<String> {
        let user = self.repo.get_by_login(&req.email).await?;
        if !verify_blocking(req.password, user.password).await? {
            return Err(Error::InvalidCredentials);
        }
        Ok(user.uid)
    }

    pub async fn get(&self, uid: &str) -> Result<User> {
        self.repo.get_by_id(uid).await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.repo.list_all().await
    }

    /// Replace name, email and password (re-hashed).
    pub async fn update(&self, uid: &str, req: RegisterUserRequest) -> Result<()> {
        let user = User {
            uid: uid.to_string(),
            name: req.name,
            email: req.email,
            password: hash_blocking(req.password).await?,
        };
        self.repo.update_by_id(uid, user).await
    }

    pub async fn delete(&self, uid: &str) -> Result<()> {
        self.repo.delete_by_id(uid).await
    }
}
