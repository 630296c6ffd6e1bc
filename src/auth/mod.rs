//! Authentication Module
//! Mission: Credential store, token service and the access guard in front of every protected route

pub mod api;
pub mod email;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod user_store;

pub use api::AuthState;
pub use email::EmailPolicy;
pub use jwt::{JwtHandler, TokenConfig, TokenError};
pub use middleware::{auth_middleware, AuthUser, GuardError};
pub use models::Claims;
pub use password::{BcryptHasher, PasswordConfig, PasswordHasher};
pub use service::{AuthError, AuthService};
pub use user_store::UserStore;
