//! User repository.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::database::now_ts;
use crate::models::user::normalize_email;
use crate::models::{NewUser, Role, UserRecord, UserUpdate};

const USER_COLUMNS: &str = "id, email, name, password_hash, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a user and returns the stored row.
    ///
    /// # Errors
    /// Returns an error if the email is taken or the insert fails.
    pub async fn create(&self, user: &NewUser) -> Result<UserRecord> {
        let now = now_ts();
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r"
            INSERT INTO users (email, name, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(normalize_email(&user.email))
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Case-insensitive email lookup.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<UserRecord>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY email ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Applies the provided fields and returns the updated row, if it exists.
    ///
    /// # Errors
    /// Returns an error if the new email is taken or the update fails.
    pub async fn update_profile(&self, id: i64, update: &UserUpdate) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r"
            UPDATE users
            SET email = COALESCE(?2, email),
                name = COALESCE(?3, name),
                role = COALESCE(?4, role),
                updated_at = ?5
            WHERE id = ?1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.email.as_deref().map(normalize_email))
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.role)
        .bind(now_ts())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Replaces the stored password hash. Returns `false` if the user does not exist.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .bind(now_ts())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user and, through cascades, everything they own.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn count_admins(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?1")
            .bind(Role::Admin)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
