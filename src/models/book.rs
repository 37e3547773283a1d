//! Book model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::borrow::BorrowRecord;
use super::library::LibraryShort;
use super::user::UserShort;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub price: Decimal,
    /// Opaque cover asset reference
    pub cover_url: Option<String>,
    pub crea_date: DateTime<Utc>,
}

/// Book with author, stocking libraries and borrow history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<UserShort>,
    pub libraries: Vec<LibraryShort>,
    pub borrows: Vec<BorrowRecord>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub author_id: i32,
    pub price: Decimal,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,
    pub author_id: Option<i32>,
    pub price: Option<Decimal>,
    pub cover_url: Option<String>,
}
