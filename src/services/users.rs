//! Authentication and member profile service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateProfile, User, UserClaims, UserProfile},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by email and password, returning a JWT and the user
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Register a new member account
    pub async fn register(&self, payload: CreateUser) -> AppResult<UserProfile> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let password_hash = self.hash_password(&payload.password)?;
        let user = self
            .repository
            .users
            .create(
                &payload.name,
                &payload.email,
                &password_hash,
                payload.phone.as_deref(),
            )
            .await?;

        Ok(user.into())
    }

    /// Fetch a member's own profile
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let user = self.repository.users.get_by_id(user_id).await?;
        Ok(user.into())
    }

    /// Update a member's own profile
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        profile: UpdateProfile,
    ) -> AppResult<UserProfile> {
        profile
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let user = self
            .repository
            .users
            .update_profile(user_id, &profile)
            .await?;
        Ok(user.into())
    }

    /// Hash a password with argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Verify a password against the stored argon2 hash
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Create a JWT for an authenticated user
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.id,
            name: user.name.clone(),
            role: user.role(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}
