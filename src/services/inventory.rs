//! Library inventory management behind the ownership guard

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        inventory::{InventoryItem, LibraryInventory},
        InventoryEntry,
    },
    repository::{Store, StoreTx},
};

use super::policy::{self, Operation};

/// Expand inventory entries with their book and borrow records
pub async fn inventory_items(
    tx: &mut dyn StoreTx,
    entries: Vec<InventoryEntry>,
) -> AppResult<Vec<InventoryItem>> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let book = tx.find_book(entry.book_id).await?.ok_or_else(|| {
            AppError::Infrastructure(format!("Inventory entry {} has no book", entry.id))
        })?;
        let borrows = tx.list_book_borrows(entry.book_id).await?;
        items.push(InventoryItem {
            id: entry.id,
            added_date: entry.added_date,
            book,
            borrows,
        });
    }
    Ok(items)
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn Store>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Stock a book in a library
    pub async fn add(&self, actor_id: i32, library_id: i32, book_id: i32) -> AppResult<InventoryEntry> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::InventoryAdd { library_id }).await?;

        if tx.find_library(library_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Library {} not found", library_id)));
        }
        if tx.find_book(book_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }
        if tx.find_inventory(library_id, book_id).await?.is_some() {
            return Err(AppError::Conflict("Book already in inventory".to_string()));
        }

        let entry = tx.insert_inventory(library_id, book_id).await?;
        tx.commit().await?;

        tracing::info!("Book {} added to library {}", book_id, library_id);
        Ok(entry)
    }

    /// Inventory of one library
    pub async fn list(&self, actor_id: i32, library_id: i32) -> AppResult<LibraryInventory> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::InventoryRead { library_id }).await?;

        let library = tx
            .find_library(library_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library {} not found", library_id)))?;
        let entries = tx.list_library_inventory(library_id).await?;
        let items = inventory_items(tx.as_mut(), entries).await?;

        Ok(LibraryInventory {
            library_id: library.id,
            name: library.name,
            items,
        })
    }

    /// Remove a book from a library's stock
    pub async fn remove(&self, actor_id: i32, library_id: i32, book_id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::InventoryRemove { library_id }).await?;

        let entry = tx.find_inventory(library_id, book_id).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "Book {} is not in the inventory of library {}",
                book_id, library_id
            ))
        })?;

        tx.delete_inventory(entry.id).await?;
        tx.commit().await?;

        tracing::info!("Book {} removed from library {}", book_id, library_id);
        Ok(())
    }
}
