//! Library management

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        library::{CreateLibrary, LibraryDetails, LibraryShort, UpdateLibrary},
        Library, UserShort,
    },
    repository::{LockScope, Store},
};

use super::{
    inventory::inventory_items,
    policy::{self, Operation},
};

#[derive(Clone)]
pub struct LibraryService {
    store: Arc<dyn Store>,
}

impl LibraryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a library, optionally with its admin
    pub async fn create(&self, actor_id: i32, data: CreateLibrary) -> AppResult<Library> {
        let mut tx = self.store.begin().await?;
        if let Some(admin_id) = data.admin_id {
            tx.lock(LockScope::AdminSeat(admin_id)).await?;
        }
        policy::enforce(
            tx.as_mut(),
            actor_id,
            Operation::LibraryCreate {
                admin_id: data.admin_id,
            },
        )
        .await?;

        let library = tx.insert_library(&data.name, data.admin_id).await?;
        tx.commit().await?;

        tracing::info!("Library {} created: {}", library.id, library.name);
        Ok(library)
    }

    pub async fn list(&self, actor_id: i32) -> AppResult<Vec<Library>> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::LibraryRead).await?;
        tx.list_libraries().await
    }

    /// Public id/name listing
    pub async fn dropdown(&self) -> AppResult<Vec<LibraryShort>> {
        let mut tx = self.store.begin().await?;
        let libraries = tx.list_libraries().await?;
        Ok(libraries.iter().map(LibraryShort::from).collect())
    }

    /// Library with its admin and inventory
    pub async fn get(&self, actor_id: i32, id: i32) -> AppResult<LibraryDetails> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::LibraryRead).await?;

        let library = tx
            .find_library(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library {} not found", id)))?;

        let admin = match library.admin_id {
            Some(admin_id) => tx.find_user(admin_id).await?.as_ref().map(UserShort::from),
            None => None,
        };

        let entries = tx.list_library_inventory(id).await?;
        let inventory = inventory_items(tx.as_mut(), entries).await?;

        Ok(LibraryDetails {
            library,
            admin,
            inventory,
        })
    }

    /// Update a library; unset fields keep their value
    pub async fn update(&self, actor_id: i32, id: i32, data: UpdateLibrary) -> AppResult<Library> {
        let mut tx = self.store.begin().await?;
        if let Some(admin_id) = data.admin_id {
            tx.lock(LockScope::AdminSeat(admin_id)).await?;
        }
        policy::enforce(
            tx.as_mut(),
            actor_id,
            Operation::LibraryUpdate {
                library_id: id,
                admin_id: data.admin_id,
            },
        )
        .await?;

        let current = tx
            .find_library(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library {} not found", id)))?;

        let name = data.name.unwrap_or(current.name);
        let admin_id = data.admin_id.or(current.admin_id);

        let library = tx.update_library(id, &name, admin_id).await?;
        tx.commit().await?;

        tracing::info!("Library {} updated", id);
        Ok(library)
    }

    /// Delete a library with its inventory and scoped assignments
    pub async fn delete(&self, actor_id: i32, id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::LibraryDelete).await?;
        tx.delete_library(id).await?;
        tx.commit().await?;

        tracing::info!("Library {} deleted", id);
        Ok(())
    }
}
