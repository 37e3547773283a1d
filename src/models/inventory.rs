//! Library inventory: which library stocks which book

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::Book;
use super::borrow::BorrowRecord;

/// Unique per (library, book)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryEntry {
    pub id: i32,
    pub library_id: i32,
    pub book_id: i32,
    pub added_date: DateTime<Utc>,
}

/// Stocked book with its borrow records
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryItem {
    pub id: i32,
    pub added_date: DateTime<Utc>,
    pub book: Book,
    pub borrows: Vec<BorrowRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddBookToInventory {
    pub book_id: i32,
}

/// Inventory listing for one library
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LibraryInventory {
    pub library_id: i32,
    pub name: String,
    pub items: Vec<InventoryItem>,
}
