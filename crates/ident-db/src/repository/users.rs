//! User operations

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;

const USER_COLUMNS: &str =
    "id, cpf, first_name, last_name, password_hash, created_at, updated_at";

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user under a freshly generated ID
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        // Check if user already exists
        let existing = self.get_user_by_cpf(&user.cpf).await?;
        if existing.is_some() {
            return Err(DbError::DuplicateCpf);
        }

        sqlx::query(
            r#"
            INSERT INTO users (id, cpf, first_name, last_name, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&user.cpf)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent sign-up for the same CPF
            sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::DuplicateCpf,
            other => DbError::from(other),
        })?;

        Ok(User {
            id,
            cpf: user.cpf,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by CPF
    pub async fn get_user_by_cpf(&self, cpf: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!("SELECT {} FROM users WHERE cpf = ?", USER_COLUMNS))
            .bind(cpf)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List users, oldest first
    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at, cpf LIMIT ? OFFSET ?",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Replace a user's stored credential secret
    pub async fn update_user_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user
    pub async fn delete_user(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count registered users
    pub async fn count_users(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }
}
