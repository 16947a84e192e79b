//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{is_unique_violation, storage_error};
use crate::domain::user::{User, UserId, UserRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, password_hash, age, created_at, updated_at";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get user", e))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get user by email", e))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get user by username", e))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, first_name, last_name, password_hash,
                               age, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id().as_str())
        .bind(user.email())
        .bind(user.username())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.password_hash())
        .bind(i16::from(user.age()))
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                conflict_for(&e, &user)
            } else {
                storage_error("Failed to create user", e)
            }
        })?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, username = $3, first_name = $4, last_name = $5,
                password_hash = $6, age = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_str())
        .bind(user.email())
        .bind(user.username())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.password_hash())
        .bind(i16::from(user.age()))
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                conflict_for(&e, user)
            } else {
                storage_error("Failed to update user", e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        }

        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list users", e))?;

        rows.iter().map(row_to_user).collect()
    }
}

fn conflict_for(error: &sqlx::Error, user: &User) -> DomainError {
    let msg = error.to_string();
    if msg.contains("email") {
        DomainError::conflict(format!("Email '{}' already exists", user.email()))
    } else if msg.contains("username") {
        DomainError::conflict(format!("Username '{}' already exists", user.username()))
    } else {
        DomainError::conflict(format!("User '{}' already exists", user.id()))
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let id: String = row.get("id");
    let age: i16 = row.get("age");

    let user_id = UserId::new(&id)
        .map_err(|e| DomainError::storage(format!("Invalid user ID in database: {}", e)))?;

    Ok(User::from_storage(
        user_id,
        row.get("email"),
        row.get("username"),
        row.get("first_name"),
        row.get("last_name"),
        row.get("password_hash"),
        age as u8,
        row.get("created_at"),
        row.get("updated_at"),
    ))
}
