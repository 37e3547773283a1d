//! Library inventory endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        inventory::{AddBookToInventory, LibraryInventory},
        InventoryEntry,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Stock a book in a library
#[utoipa::path(
    post,
    path = "/libraries/{id}/inventory",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library ID")
    ),
    request_body = AddBookToInventory,
    responses(
        (status = 201, description = "Book added", body = InventoryEntry),
        (status = 403, description = "Not the admin of this library"),
        (status = 404, description = "Library or book not found"),
        (status = 409, description = "Book already in inventory")
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(library_id): Path<i32>,
    Json(request): Json<AddBookToInventory>,
) -> AppResult<(StatusCode, Json<InventoryEntry>)> {
    let entry = state
        .services
        .inventory
        .add(claims.user_id, library_id, request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Inventory of a library
#[utoipa::path(
    get,
    path = "/libraries/{id}/inventory",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library ID")
    ),
    responses(
        (status = 200, description = "Inventory", body = LibraryInventory),
        (status = 403, description = "Not the admin of this library")
    )
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(library_id): Path<i32>,
) -> AppResult<Json<LibraryInventory>> {
    let inventory = state.services.inventory.list(claims.user_id, library_id).await?;
    Ok(Json(inventory))
}

/// Remove a book from a library
#[utoipa::path(
    delete,
    path = "/libraries/{id}/inventory/{book_id}",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Library ID"),
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book removed"),
        (status = 403, description = "Not the admin of this library"),
        (status = 404, description = "Book not in inventory")
    )
)]
pub async fn remove_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((library_id, book_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state
        .services
        .inventory
        .remove(claims.user_id, library_id, book_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
