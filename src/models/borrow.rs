//! Borrow records (one lending episode each)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// BORROWED on creation, RETURNED is terminal for the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "BORROWED",
            BorrowStatus::Returned => "RETURNED",
        }
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BORROWED" => Ok(BorrowStatus::Borrowed),
            "RETURNED" => Ok(BorrowStatus::Returned),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

impl_text_type!(BorrowStatus);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub status: BorrowStatus,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub charge: Decimal,
}

impl BorrowRecord {
    pub fn is_active(&self) -> bool {
        self.status == BorrowStatus::Borrowed
    }
}

/// Borrow request
#[derive(Debug, Deserialize, ToSchema)]
pub struct BorrowBook {
    pub book_id: i32,
    pub charge: Decimal,
}
