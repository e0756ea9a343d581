use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

pub struct UserRepo;

impl UserRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        email: &str,
        password_hash: Option<&str>,
        name: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO "user" (user_id, email, password_hash, name) VALUES ($1, $2, $3, $4)"#,
        )
        .bind(user_id)
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create user")?;
        Ok(())
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT user_id, name, email, password_hash, role, is_active, created_at, last_login_at FROM "user" WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;
        Ok(row)
    }

    pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT user_id, name, email, password_hash, role, is_active, created_at, last_login_at FROM "user" WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by id")?;
        Ok(row)
    }

    /// Insert-or-fetch keyed on the unique email index.
    ///
    /// If a row with this email already exists it is returned unchanged;
    /// otherwise a new row is inserted and returned. Safe under concurrent
    /// first use: `ON CONFLICT DO NOTHING` means two racing callers both end
    /// up reading the single surviving row.
    pub async fn find_or_create(
        pool: &PgPool,
        email: &str,
        password_hash: Option<&str>,
        name: Option<&str>,
    ) -> Result<UserRow> {
        sqlx::query(
            r#"INSERT INTO "user" (user_id, email, password_hash, name) VALUES ($1, $2, $3, $4) ON CONFLICT (email) DO NOTHING"#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to insert user")?;

        Self::get_by_email(pool, email)
            .await?
            .context("User missing after insert-or-fetch")
    }

    pub async fn touch_last_login(pool: &PgPool, user_id: Uuid) -> Result<()> {
        sqlx::query(r#"UPDATE "user" SET last_login_at = NOW() WHERE user_id = $1"#)
            .bind(user_id)
            .execute(pool)
            .await
            .context("Failed to update last_login_at")?;
        Ok(())
    }

    pub async fn set_active(pool: &PgPool, user_id: Uuid, is_active: bool) -> Result<()> {
        sqlx::query(r#"UPDATE "user" SET is_active = $2 WHERE user_id = $1"#)
            .bind(user_id)
            .bind(is_active)
            .execute(pool)
            .await
            .context("Failed to update is_active")?;
        Ok(())
    }

    pub async fn list_active(pool: &PgPool) -> Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"SELECT user_id, name, email, password_hash, role, is_active, created_at, last_login_at FROM "user" WHERE is_active ORDER BY created_at"#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;
        Ok(rows)
    }
}
