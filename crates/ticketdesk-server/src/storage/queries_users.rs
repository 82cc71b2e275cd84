//! User account queries.

use ticketdesk_core::db::unix_timestamp;

use super::db::{DatabaseError, TicketDatabase};
use super::models::{NewUser, User};

impl TicketDatabase {
    /// Create a new user.
    pub async fn create_user(&self, user: &NewUser<'_>) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        let id = sqlx::query(
            "INSERT INTO users (name, title, role, email, password_hash, is_admin, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.name)
        .bind(user.title)
        .bind(user.role)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.is_admin)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        self.get_user(id).await
    }

    /// Create `user` as an admin, but only while the table is empty.
    ///
    /// The emptiness check and the insert are one statement, so concurrent
    /// bootstrap attempts yield at most one admin. `None` means another
    /// account already exists.
    pub async fn create_first_admin(
        &self,
        user: &NewUser<'_>,
    ) -> Result<Option<User>, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO users (name, title, role, email, password_hash, is_admin, created_at, updated_at) \
             SELECT ?, ?, ?, ?, ?, 1, ?, ? WHERE NOT EXISTS (SELECT 1 FROM users)",
        )
        .bind(user.name)
        .bind(user.title)
        .bind(user.role)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(result.last_insert_rowid()).await.map(Some)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: i64) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User with email {email}")))
    }

    pub async fn count_users(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    /// List every user, ordered by name.
    pub async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name, id")
            .fetch_all(self.pool())
            .await?;
        Ok(users)
    }

    /// Update the profile fields of a user.
    pub async fn update_user_profile(
        &self,
        id: i64,
        name: &str,
        title: &str,
        role: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET name = ?, title = ?, role = ?, updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(title)
        .bind(role)
        .bind(unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_user_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Activate or deactivate an account.
    pub async fn set_user_active(&self, id: i64, is_active: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a user. Team assignments cascade; `updated_by` is nulled.
    pub async fn delete_user(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
