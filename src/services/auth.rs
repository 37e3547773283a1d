//! Identity and session service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{NewUser, RegisterUser, User, UserClaims, UserWithRoles},
    repository::{LockScope, Store},
};

use super::assignments;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Create an identity with its first assignment and open a session.
    ///
    /// The first identity ever registered becomes an approved SUPER_ADMIN;
    /// every later one needs a role id. Both paths run in one transaction
    /// under the registration lock.
    pub async fn register(&self, data: RegisterUser) -> AppResult<(String, UserWithRoles)> {
        let password_hash = self.hash_password(&data.password)?;

        let mut tx = self.store.begin().await?;
        tx.lock(LockScope::Registration).await?;

        if tx.find_user_by_email(&data.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let first = tx.count_users().await? == 0;

        let user = tx
            .insert_user(&NewUser {
                name: data.name,
                email: data.email,
                password_hash,
            })
            .await?;

        let assignment = if first {
            assignments::bootstrap_assignment(tx.as_mut(), user.id).await?
        } else {
            assignments::create_assignment(tx.as_mut(), user.id, data.role_id, data.library_id)
                .await?
        };

        let token = self.create_token_for_user(&user)?;
        tx.set_user_token(user.id, Some(token.as_str())).await?;
        tx.commit().await?;

        tracing::info!("Registered user {} ({})", user.id, user.email);
        Ok((
            token,
            UserWithRoles {
                user,
                roles: vec![assignment],
            },
        ))
    }

    /// Verify credentials and issue a fresh token, replacing any previous session
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, UserWithRoles)> {
        let mut tx = self.store.begin().await?;

        let user = tx
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::warn!("Failed login for {}", email);
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.create_token_for_user(&user)?;
        tx.set_user_token(user.id, Some(token.as_str())).await?;
        let roles = tx.list_user_assignments(user.id, None).await?;
        tx.commit().await?;

        Ok((token, UserWithRoles { user, roles }))
    }

    /// Clear the stored session token
    pub async fn logout(&self, user_id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        tx.set_user_token(user_id, None).await?;
        tx.commit().await?;
        tracing::info!("User {} logged out", user_id);
        Ok(())
    }

    /// Resolve a bearer token to its claims.
    ///
    /// The token must be valid and equal to the identity's stored token.
    pub async fn authenticate(&self, token: &str) -> AppResult<UserClaims> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user(claims.user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Unknown user".to_string()))?;

        if user.token.as_deref() != Some(token) {
            return Err(AppError::Authentication("Session expired".to_string()));
        }

        Ok(claims)
    }

    /// Identity with all of its assignments
    pub async fn me(&self, user_id: i32) -> AppResult<UserWithRoles> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;
        let roles = tx.list_user_assignments(user_id, None).await?;
        Ok(UserWithRoles { user, roles })
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            jti: uuid::Uuid::new_v4().to_string(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Infrastructure(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Infrastructure("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Infrastructure(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
