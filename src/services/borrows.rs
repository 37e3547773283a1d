//! Borrow lifecycle: BORROWED on creation, RETURNED is terminal

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{BorrowRecord, BorrowStatus},
    repository::{LockScope, Store},
};

use super::policy::{self, Operation};

#[derive(Clone)]
pub struct BorrowService {
    store: Arc<dyn Store>,
}

impl BorrowService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Borrow a book stocked in one of the borrower's libraries
    pub async fn borrow(&self, user_id: i32, book_id: i32, charge: Decimal) -> AppResult<BorrowRecord> {
        if charge.is_sign_negative() {
            return Err(AppError::InvalidInput("Charge cannot be negative".to_string()));
        }

        let mut tx = self.store.begin().await?;
        tx.lock(LockScope::Borrower(user_id)).await?;
        policy::enforce(tx.as_mut(), user_id, Operation::BorrowCreate { book_id }).await?;

        if tx.find_active_borrow(user_id, book_id).await?.is_some() {
            return Err(AppError::Conflict("Book already borrowed".to_string()));
        }

        let record = tx.insert_borrow(user_id, book_id, charge, Utc::now()).await?;
        tx.commit().await?;

        tracing::info!("User {} borrowed book {} (record {})", user_id, book_id, record.id);
        Ok(record)
    }

    /// Return one of the caller's own active borrows.
    /// Unknown, foreign and already returned records are all NotFound.
    pub async fn return_book(&self, borrow_id: i32, user_id: i32) -> AppResult<BorrowRecord> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), user_id, Operation::BorrowReturn).await?;

        let record = tx
            .find_borrow(borrow_id, user_id, BorrowStatus::Borrowed)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow record {} not found", borrow_id)))?;

        let returned = tx.mark_returned(record.id, Utc::now()).await?;
        tx.commit().await?;

        tracing::info!("User {} returned book {} (record {})", user_id, returned.book_id, returned.id);
        Ok(returned)
    }

    /// The caller's own borrow records
    pub async fn list_mine(&self, user_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), user_id, Operation::BorrowRead).await?;
        tx.list_user_borrows(user_id).await
    }
}
