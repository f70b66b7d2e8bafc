//! User repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use notevault_core::{Error, Result, User, UserRepository};

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row_to_user(row: PgRow) -> Result<User> {
    Ok(User {
        uid: row.try_get("uid")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
    })
}

fn user_not_found(key: &str) -> Error {
    Error::NotFound(format!("User {} not found", key))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn save(&self, user: User) -> Result<()> {
        sqlx::query("INSERT INTO users (uid, name, email, password) VALUES ($1, $2, $3, $4)")
            .bind(&user.uid)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::from_sqlx_unique(e, format!("user '{}'", user.email)))?;
        Ok(())
    }

    async fn get_by_login(&self, email: &str) -> Result<User> {
        let row = sqlx::query("SELECT uid, name, email, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(map_row_to_user)
            .unwrap_or_else(|| Err(user_not_found(email)))
    }

    async fn get_by_id(&self, uid: &str) -> Result<User> {
        let row = sqlx::query("SELECT uid, name, email, password FROM users WHERE uid = $1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(map_row_to_user)
            .unwrap_or_else(|| Err(user_not_found(uid)))
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT uid, name, email, password FROM users ORDER BY email")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        if rows.is_empty() {
            return Err(Error::NoneAvailable("users".to_string()));
        }
        rows.into_iter().map(map_row_to_user).collect()
    }

    async fn update_by_id(&self, uid: &str, user: User) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET name = $1, email = $2, password = $3 WHERE uid = $4")
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password)
                .bind(uid)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::from_sqlx_unique(e, format!("user '{}'", user.email)))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(uid));
        }
        Ok(())
    }

    async fn delete_by_id(&self, uid: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(uid));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
