//! API handlers for the lending REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod inventory;
pub mod libraries;
pub mod openapi;
pub mod roles;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for the authenticated identity behind a bearer token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        // Signature, expiry and single active session
        let claims = state.services.auth.authenticate(token).await?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Roles
        .route("/roles/dropdown", get(roles::roles_dropdown))
        // Role assignments
        .route("/users/approve", post(users::approve_role))
        .route("/users/pending-roles", get(users::list_pending_roles))
        .route("/users/me/roles", get(users::list_my_roles))
        .route("/users/me/roles", post(users::apply_for_role))
        // Libraries
        .route("/libraries", post(libraries::create_library))
        .route("/libraries", get(libraries::list_libraries))
        .route("/libraries/dropdown", get(libraries::libraries_dropdown))
        .route("/libraries/:id", get(libraries::get_library))
        .route("/libraries/:id", put(libraries::update_library))
        .route("/libraries/:id", delete(libraries::delete_library))
        // Inventory
        .route("/libraries/:id/inventory", post(inventory::add_book))
        .route("/libraries/:id/inventory", get(inventory::list_inventory))
        .route("/libraries/:id/inventory/:book_id", delete(inventory::remove_book))
        // Books
        .route("/books", post(books::create_book))
        .route("/books", get(books::list_books))
        .route("/books/borrow", post(books::borrow_book))
        .route("/books/borrows", get(books::list_my_borrows))
        .route("/books/return/:id", put(books::return_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id", put(books::update_book))
        .route("/books/:id", delete(books::delete_book))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
