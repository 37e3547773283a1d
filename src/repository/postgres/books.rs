//! Book queries

use async_trait::async_trait;
use chrono::Utc;

use super::PgStoreTx;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBook, UpdateBook},
        Book,
    },
    repository::BooksRepository,
};

#[async_trait]
impl BooksRepository for PgStoreTx {
    async fn insert_book(&mut self, book: &CreateBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, price, cover_url, crea_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.price)
        .bind(&book.cover_url)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_book(&mut self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(book)
    }

    async fn list_books(&mut self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(books)
    }

    async fn update_book(&mut self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.author_id, "author_id");
        add_field!(data.price, "price");
        add_field!(data.cover_url, "cover_url");

        if sets.is_empty() {
            return self
                .find_book(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)));
        }

        let query = format!(
            "UPDATE books SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Book>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.title);
        bind_field!(data.author_id);
        bind_field!(data.price);
        bind_field!(data.cover_url);

        builder
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    async fn delete_book(&mut self, id: i32) -> AppResult<()> {
        // Inventory entries and borrow history cascade
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}
