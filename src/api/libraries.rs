//! Library endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        library::{CreateLibrary, LibraryDetails, LibraryShort, UpdateLibrary},
        Library,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Create a library
#[utoipa::path(
    post,
    path = "/libraries",
    tag = "libraries",
    security(("bearer_auth" = [])),
    request_body = CreateLibrary,
    responses(
        (status = 201, description = "Library created", body = Library),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Admin not found"),
        (status = 409, description = "Admin already administers a library")
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLibrary>,
) -> AppResult<(StatusCode, Json<Library>)> {
    request.validate()?;

    let library = state.services.libraries.create(claims.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// List libraries
#[utoipa::path(
    get,
    path = "/libraries",
    tag = "libraries",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Libraries", body = Vec<Library>),
        (status = 403, description = "Not allowed")
    )
)]
pub async fn list_libraries(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Library>>> {
    let libraries = state.services.libraries.list(claims.user_id).await?;
    Ok(Json(libraries))
}

/// Id and name of every library, no authentication
#[utoipa::path(
    get,
    path = "/libraries/dropdown",
    tag = "libraries",
    responses(
        (status = 200, description = "Libraries", body = Vec<LibraryShort>)
    )
)]
pub async fn libraries_dropdown(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LibraryShort>>> {
    let libraries = state.services.libraries.dropdown().await?;
    Ok(Json(libraries))
}

/// Library with admin and inventory
#[utoipa::path(
    get,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library ID")
    ),
    responses(
        (status = 200, description = "Library details", body = LibraryDetails),
        (status = 404, description = "Library not found")
    )
)]
pub async fn get_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LibraryDetails>> {
    let library = state.services.libraries.get(claims.user_id, id).await?;
    Ok(Json(library))
}

/// Update a library
#[utoipa::path(
    put,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library ID")
    ),
    request_body = UpdateLibrary,
    responses(
        (status = 200, description = "Library updated", body = Library),
        (status = 404, description = "Library or admin not found"),
        (status = 409, description = "Admin already administers another library")
    )
)]
pub async fn update_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateLibrary>,
) -> AppResult<Json<Library>> {
    request.validate()?;

    let library = state.services.libraries.update(claims.user_id, id, request).await?;
    Ok(Json(library))
}

/// Delete a library
#[utoipa::path(
    delete,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library ID")
    ),
    responses(
        (status = 204, description = "Library deleted"),
        (status = 404, description = "Library not found")
    )
)]
pub async fn delete_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.libraries.delete(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
