//! Credential Issuance
//! Mission: Registration and login flows on top of the store, hasher and JWT handler

use crate::auth::email::EmailPolicy;
use crate::auth::jwt::{JwtHandler, TokenError};
use crate::auth::models::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, User};
use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::user_store::UserStore;
use crate::db::StoreError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered!")]
    DuplicateEmail,
    #[error("User not found")]
    UserNotFound,
    #[error("Incorrect password")]
    BadCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            other => AuthError::Internal(anyhow::Error::new(other).context("credential store")),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(anyhow::Error::new(err))
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Internal(anyhow::Error::new(err).context("token issuance"))
    }
}

/// Register / login orchestration
#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
    hasher: Arc<dyn PasswordHasher>,
    jwt: Arc<JwtHandler>,
    email_policy: EmailPolicy,
}

impl AuthService {
    pub fn new(
        users: UserStore,
        hasher: Arc<dyn PasswordHasher>,
        jwt: Arc<JwtHandler>,
        email_policy: EmailPolicy,
    ) -> Self {
        Self {
            users,
            hasher,
            jwt,
            email_policy,
        }
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// Create an account. Does not log the user in.
    pub fn register(&self, req: &RegisterRequest) -> Result<User, AuthError> {
        let name = req.name.trim();
        let email = req.email.trim().to_ascii_lowercase();

        if name.is_empty() {
            return Err(AuthError::Validation("Name is required.".to_string()));
        }
        if req.password.is_empty() {
            return Err(AuthError::Validation("Password is required.".to_string()));
        }
        if !self.email_policy.permits(&email) {
            return Err(AuthError::Validation(format!(
                "Registration restricted to {} emails only.",
                self.email_policy.domain()
            )));
        }

        if self.users.find_by_email(&email)?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(&req.password)?;
        // The unique constraint still guards the race between check and insert
        let user = self.users.create(name, &email, &password_hash)?;

        info!("Registered {} ({})", user.email, user.id);
        Ok(user)
    }

    /// Check credentials and issue a token
    pub fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let email = req.email.trim().to_ascii_lowercase();

        let Some(user) = self.users.find_by_email(&email)? else {
            warn!("Login for unknown email: {}", email);
            return Err(AuthError::UserNotFound);
        };

        if !self.hasher.verify(&req.password, &user.password_hash)? {
            warn!("Failed login attempt: {}", email);
            return Err(AuthError::BadCredentials);
        }

        let issued = self.jwt.issue(&user.identity())?;
        info!("Login successful: {} ({})", user.email, user.id);

        Ok(LoginResponse {
            token: issued.token,
            user: PublicUser::from_user(&user),
        })
    }
}
