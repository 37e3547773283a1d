//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, inventory, libraries, roles, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending API",
        version = "0.1.0",
        description = "Multi-tenant library lending REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        // Roles
        roles::roles_dropdown,
        // Assignments
        users::approve_role,
        users::list_pending_roles,
        users::list_my_roles,
        users::apply_for_role,
        // Libraries
        libraries::create_library,
        libraries::list_libraries,
        libraries::libraries_dropdown,
        libraries::get_library,
        libraries::update_library,
        libraries::delete_library,
        // Inventory
        inventory::add_book,
        inventory::list_inventory,
        inventory::remove_book,
        // Books
        books::create_book,
        books::list_books,
        books::get_book,
        books::update_book,
        books::delete_book,
        // Borrows
        books::borrow_book,
        books::return_book,
        books::list_my_borrows,
    ),
    components(
        schemas(
            // Auth
            auth::AuthResponse,
            auth::MessageResponse,
            crate::models::user::RegisterUser,
            crate::models::user::LoginRequest,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::UserWithRoles,
            // Roles and assignments
            crate::models::role::Role,
            crate::models::role::RoleName,
            crate::models::assignment::RoleAssignment,
            crate::models::assignment::AssignmentStatus,
            crate::models::assignment::ApplyForRole,
            crate::models::assignment::ApproveAssignment,
            // Libraries
            crate::models::library::Library,
            crate::models::library::LibraryShort,
            crate::models::library::LibraryDetails,
            crate::models::library::CreateLibrary,
            crate::models::library::UpdateLibrary,
            // Inventory
            crate::models::inventory::InventoryEntry,
            crate::models::inventory::InventoryItem,
            crate::models::inventory::AddBookToInventory,
            crate::models::inventory::LibraryInventory,
            // Books
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrows
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowStatus,
            crate::models::borrow::BorrowBook,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and sessions"),
        (name = "roles", description = "Role catalog"),
        (name = "users", description = "Role assignments and approval"),
        (name = "libraries", description = "Library management"),
        (name = "inventory", description = "Library inventory"),
        (name = "books", description = "Book management"),
        (name = "borrows", description = "Borrowing and returns")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
