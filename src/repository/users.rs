//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{UpdateProfile, User},
    repository::is_unique_violation,
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (primary authentication method)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Create a member account
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        phone: Option<&str>,
    ) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, 'MEMBER')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        result.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email or phone number already registered".to_string())
            } else {
                e.into()
            }
        })
    }

    /// Update a member's own profile
    pub async fn update_profile(&self, id: Uuid, profile: &UpdateProfile) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $1,
                phone = $2,
                avatar_url = COALESCE($3, avatar_url)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&profile.name)
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::NotFound(format!("User with id {} not found", id))),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
                "Phone number already used by another account".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
