//! Role catalog endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::Role, AppState};

/// Roles open to applications (SUPER_ADMIN excluded)
#[utoipa::path(
    get,
    path = "/roles/dropdown",
    tag = "roles",
    responses(
        (status = 200, description = "Roles", body = Vec<Role>)
    )
)]
pub async fn roles_dropdown(State(state): State<AppState>) -> AppResult<Json<Vec<Role>>> {
    let roles = state.services.catalog.roles_dropdown().await?;
    Ok(Json(roles))
}
