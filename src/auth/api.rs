//! Authentication API Endpoints
//! Mission: Register, login, and identity endpoints

use crate::auth::{
    middleware::AuthUser,
    models::{
        DashboardResponse, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest,
        UpdateProfileRequest,
    },
    service::{AuthError, AuthService},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub service: AuthService,
}

impl AuthState {
    pub fn new(service: AuthService) -> Self {
        Self { service }
    }
}

/// Run bcrypt-bound work off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, AuthApiError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthApiError(AuthError::Internal(anyhow::Error::new(e))))?
        .map_err(AuthApiError)
}

/// Any body rejection becomes a 400 validation error
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AuthApiError(AuthError::Validation(rejection.body_text())))
}

/// Register endpoint - POST /api/register
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<&'static str, AuthApiError> {
    let payload = json_body(payload)?;
    let service = state.service.clone();
    run_blocking(move || service.register(&payload)).await?;

    // No token here: the client logs in separately
    Ok("User registered!")
}

/// Login endpoint - POST /api/login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let payload = json_body(payload)?;
    let service = state.service.clone();
    let response = run_blocking(move || service.login(&payload)).await?;
    Ok(Json(response))
}

/// Dashboard - GET /api/dashboard
pub async fn dashboard(AuthUser(claims): AuthUser) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        message: format!("Welcome {}", claims.name),
        user: claims,
    })
}

/// Update display name - PUT /api/profile
pub async fn update_profile(
    State(state): State<AuthState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, AuthApiError> {
    let payload = json_body(payload)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AuthApiError(AuthError::Validation(
            "Name is required.".to_string(),
        )));
    }

    let user = state
        .service
        .users()
        .update_name(claims.id, name)
        .map_err(|e| AuthApiError(e.into()))?
        .ok_or(AuthApiError(AuthError::UserNotFound))?;

    Ok(Json(ProfileResponse {
        message: "Profile updated".to_string(),
        user,
    }))
}

/// Auth API errors
#[derive(Debug)]
pub struct AuthApiError(pub AuthError);

impl From<AuthError> for AuthApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuthError::Validation(_)
            | AuthError::DuplicateEmail
            | AuthError::UserNotFound
            | AuthError::BadCredentials => StatusCode::BAD_REQUEST,
            AuthError::Internal(e) => {
                error!("Auth request failed: {:#}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response();
            }
        };

        (status, self.0.to_string()).into_response()
    }
}
