//! Business logic services

pub mod assignments;
pub mod auth;
pub mod books;
pub mod borrows;
pub mod catalog;
pub mod inventory;
pub mod libraries;
pub mod permissions;
pub mod policy;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Store};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub permissions: permissions::PermissionService,
    pub policy: policy::PolicyService,
    pub assignments: assignments::AssignmentService,
    pub libraries: libraries::LibraryService,
    pub books: books::BookService,
    pub inventory: inventory::InventoryService,
    pub borrows: borrows::BorrowService,
}

impl Services {
    /// Create all services over one store
    pub fn new(store: Arc<dyn Store>, auth_config: AuthConfig) -> Self {
        Self {
            auth: auth::AuthService::new(store.clone(), auth_config),
            catalog: catalog::CatalogService::new(store.clone()),
            permissions: permissions::PermissionService::new(store.clone()),
            policy: policy::PolicyService::new(store.clone()),
            assignments: assignments::AssignmentService::new(store.clone()),
            libraries: libraries::LibraryService::new(store.clone()),
            books: books::BookService::new(store.clone()),
            inventory: inventory::InventoryService::new(store.clone()),
            borrows: borrows::BorrowService::new(store),
        }
    }
}
