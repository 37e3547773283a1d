//! Book management

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookDetails, CreateBook, UpdateBook},
        library::LibraryShort,
        Book, UserShort,
    },
    repository::{Store, StoreTx},
};

use super::policy::{self, Operation};

fn check_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::InvalidInput("Price must be positive".to_string()));
    }
    Ok(())
}

async fn check_author(tx: &mut dyn StoreTx, author_id: i32) -> AppResult<()> {
    if tx.find_user(author_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Author {} not found", author_id)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn Store>,
}

impl BookService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor_id: i32, data: CreateBook) -> AppResult<Book> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::BookCreate).await?;

        check_price(data.price)?;
        check_author(tx.as_mut(), data.author_id).await?;

        let book = tx.insert_book(&data).await?;
        tx.commit().await?;

        tracing::info!("Book {} created: {}", book.id, book.title);
        Ok(book)
    }

    pub async fn list(&self, actor_id: i32) -> AppResult<Vec<Book>> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::BookRead).await?;
        tx.list_books().await
    }

    /// Book with author, stocking libraries and borrow history
    pub async fn get(&self, actor_id: i32, id: i32) -> AppResult<BookDetails> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::BookRead).await?;

        let book = tx
            .find_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        let author = tx.find_user(book.author_id).await?.as_ref().map(UserShort::from);

        let mut libraries = Vec::new();
        for entry in tx.list_book_inventory(id).await? {
            if let Some(library) = tx.find_library(entry.library_id).await? {
                libraries.push(LibraryShort::from(&library));
            }
        }

        let borrows = tx.list_book_borrows(id).await?;

        Ok(BookDetails {
            book,
            author,
            libraries,
            borrows,
        })
    }

    pub async fn update(&self, actor_id: i32, id: i32, data: UpdateBook) -> AppResult<Book> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::BookUpdate).await?;

        if tx.find_book(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        if let Some(price) = data.price {
            check_price(price)?;
        }
        if let Some(author_id) = data.author_id {
            check_author(tx.as_mut(), author_id).await?;
        }

        let book = tx.update_book(id, &data).await?;
        tx.commit().await?;
        Ok(book)
    }

    /// Delete a book unless a copy is currently borrowed
    pub async fn delete(&self, actor_id: i32, id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::BookDelete).await?;

        if tx.find_book(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        let borrows = tx.list_book_borrows(id).await?;
        if borrows.iter().any(|b| b.is_active()) {
            return Err(AppError::Conflict(
                "Book is currently borrowed".to_string(),
            ));
        }

        tx.delete_book(id).await?;
        tx.commit().await?;

        tracing::info!("Book {} deleted", id);
        Ok(())
    }
}
