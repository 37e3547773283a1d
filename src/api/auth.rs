//! Registration and session endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, RegisterUser, UserWithRoles},
    AppState,
};

use super::AuthenticatedUser;

/// Token and identity returned on register and login
#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token, replaces any previous session
    pub token: String,
    pub user: UserWithRoles,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new identity
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input or role"),
        (status = 409, description = "Email taken or library already has an admin")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;

    let (token, user) = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;

    let (token, user) = state
        .services
        .auth
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(AuthResponse { token, user }))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth.logout(claims.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Current identity with its role assignments
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserWithRoles),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserWithRoles>> {
    let user = state.services.auth.me(claims.user_id).await?;
    Ok(Json(user))
}
