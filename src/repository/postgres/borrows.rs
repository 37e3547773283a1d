//! Borrow record queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{conflict_on_unique, PgStoreTx};
use crate::{
    error::{AppError, AppResult},
    models::{BorrowRecord, BorrowStatus},
    repository::BorrowsRepository,
};

#[async_trait]
impl BorrowsRepository for PgStoreTx {
    async fn insert_borrow(
        &mut self,
        user_id: i32,
        book_id: i32,
        charge: Decimal,
        borrow_date: DateTime<Utc>,
    ) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO book_borrowers (user_id, book_id, status, borrow_date, charge)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(BorrowStatus::Borrowed)
        .bind(borrow_date)
        .bind(charge)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(conflict_on_unique("Book already borrowed"))
    }

    async fn find_active_borrow(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM book_borrowers
            WHERE user_id = $1 AND book_id = $2 AND status = 'BORROWED'
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(record)
    }

    async fn find_borrow(
        &mut self,
        id: i32,
        user_id: i32,
        status: BorrowStatus,
    ) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM book_borrowers WHERE id = $1 AND user_id = $2 AND status = $3",
        )
        .bind(id)
        .bind(user_id)
        .bind(status)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(record)
    }

    async fn mark_returned(
        &mut self,
        id: i32,
        return_date: DateTime<Utc>,
    ) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>(
            r#"
            UPDATE book_borrowers SET status = $1, return_date = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(BorrowStatus::Returned)
        .bind(return_date)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow record {} not found", id)))
    }

    async fn list_user_borrows(&mut self, user_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM book_borrowers WHERE user_id = $1 ORDER BY borrow_date DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(records)
    }

    async fn list_book_borrows(&mut self, book_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM book_borrowers WHERE book_id = $1 ORDER BY borrow_date DESC",
        )
        .bind(book_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(records)
    }
}
