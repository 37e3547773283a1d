//! Book and borrowing endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, CreateBook, UpdateBook},
        borrow::BorrowBook,
        Book, BorrowRecord,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid price"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    request.validate()?;

    let book = state.services.books.create(claims.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// List books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Books", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list(claims.user_id).await?;
    Ok(Json(books))
}

/// Book with author, libraries and borrow history
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.books.get(claims.user_id, id).await?;
    Ok(Json(book))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book or author not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    request.validate()?;

    let book = state.services.books.update(claims.user_id, id, request).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is currently borrowed")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.books.delete(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/books/borrow",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = BorrowBook,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowRecord),
        (status = 403, description = "Not a borrower of a stocking library"),
        (status = 404, description = "Book not stocked anywhere"),
        (status = 409, description = "Already borrowed")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowBook>,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    let record = state
        .services
        .borrows
        .borrow(claims.user_id, request.book_id, request.charge)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/books/return/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BorrowRecord),
        (status = 404, description = "No active borrow with this id for the caller")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowRecord>> {
    let record = state.services.borrows.return_book(id, claims.user_id).await?;
    Ok(Json(record))
}

/// The caller's borrow records
#[utoipa::path(
    get,
    path = "/books/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrow records", body = Vec<BorrowRecord>)
    )
)]
pub async fn list_my_borrows(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    let records = state.services.borrows.list_mine(claims.user_id).await?;
    Ok(Json(records))
}
