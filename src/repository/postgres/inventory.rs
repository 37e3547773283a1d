//! Library inventory queries

use async_trait::async_trait;

use super::{conflict_on_unique, PgStoreTx};
use crate::{error::AppResult, models::InventoryEntry, repository::InventoryRepository};

#[async_trait]
impl InventoryRepository for PgStoreTx {
    async fn insert_inventory(
        &mut self,
        library_id: i32,
        book_id: i32,
    ) -> AppResult<InventoryEntry> {
        sqlx::query_as::<_, InventoryEntry>(
            r#"
            INSERT INTO library_inventory (library_id, book_id, added_date)
            VALUES ($1, $2, NOW())
            RETURNING *
            "#,
        )
        .bind(library_id)
        .bind(book_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(conflict_on_unique("Book already in inventory"))
    }

    async fn find_inventory(
        &mut self,
        library_id: i32,
        book_id: i32,
    ) -> AppResult<Option<InventoryEntry>> {
        let entry = sqlx::query_as::<_, InventoryEntry>(
            "SELECT * FROM library_inventory WHERE library_id = $1 AND book_id = $2",
        )
        .bind(library_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(entry)
    }

    async fn list_book_inventory(&mut self, book_id: i32) -> AppResult<Vec<InventoryEntry>> {
        let entries = sqlx::query_as::<_, InventoryEntry>(
            "SELECT * FROM library_inventory WHERE book_id = $1 ORDER BY id",
        )
        .bind(book_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(entries)
    }

    async fn list_library_inventory(
        &mut self,
        library_id: i32,
    ) -> AppResult<Vec<InventoryEntry>> {
        let entries = sqlx::query_as::<_, InventoryEntry>(
            "SELECT * FROM library_inventory WHERE library_id = $1 ORDER BY added_date",
        )
        .bind(library_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(entries)
    }

    async fn delete_inventory(&mut self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM library_inventory WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}
