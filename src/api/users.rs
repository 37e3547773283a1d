//! Role assignment endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        assignment::{ApplyForRole, ApproveAssignment},
        RoleAssignment,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Approve a pending role assignment
#[utoipa::path(
    post,
    path = "/users/approve",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = ApproveAssignment,
    responses(
        (status = 200, description = "Assignment approved", body = RoleAssignment),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Already approved")
    )
)]
pub async fn approve_role(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ApproveAssignment>,
) -> AppResult<Json<RoleAssignment>> {
    let assignment = state
        .services
        .assignments
        .approve(claims.user_id, request.user_id, request.role_id, request.library_id)
        .await?;
    Ok(Json(assignment))
}

/// Assignments waiting for approval
#[utoipa::path(
    get,
    path = "/users/pending-roles",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending assignments", body = Vec<RoleAssignment>),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn list_pending_roles(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RoleAssignment>>> {
    let pending = state.services.assignments.list_pending(claims.user_id).await?;
    Ok(Json(pending))
}

/// The caller's own assignments
#[utoipa::path(
    get,
    path = "/users/me/roles",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Assignments", body = Vec<RoleAssignment>)
    )
)]
pub async fn list_my_roles(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RoleAssignment>>> {
    let roles = state.services.assignments.list_for_user(claims.user_id).await?;
    Ok(Json(roles))
}

/// Apply for an additional role
#[utoipa::path(
    post,
    path = "/users/me/roles",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = ApplyForRole,
    responses(
        (status = 201, description = "Pending assignment created", body = RoleAssignment),
        (status = 400, description = "Invalid role or library"),
        (status = 409, description = "Already requested or library already has an admin")
    )
)]
pub async fn apply_for_role(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ApplyForRole>,
) -> AppResult<(StatusCode, Json<RoleAssignment>)> {
    let assignment = state
        .services
        .assignments
        .create(claims.user_id, Some(request.role_id), request.library_id)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}
