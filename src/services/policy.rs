//! Policy registry
//!
//! Every protected operation is described by an [`Operation`], which maps
//! to the [`Policy`] list it requires. A single evaluator runs any policy
//! against an open transaction, so data-dependent guards execute inside the
//! critical section of the write they protect.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{ActionKind, AssignmentStatus, Resource, RoleName},
    repository::{Store, StoreTx},
};

use super::permissions;

/// One authorization rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Coarse catalog check, library scope ignored
    Permission { resource: Resource, action: ActionKind },
    /// Acting identity is the approved LIBRARY_ADMIN of this library
    InventoryOwner { library_id: i32 },
    /// `admin_id` exists and administers no library other than the excluded one
    LibraryAdminCandidate {
        admin_id: i32,
        exclude_library_id: Option<i32>,
    },
    /// Acting identity's approved BORROWER library stocks the book
    BorrowerAffinity { book_id: i32 },
}

impl Policy {
    fn permission(resource: Resource, action: ActionKind) -> Self {
        Policy::Permission { resource, action }
    }
}

/// Protected operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LibraryCreate { admin_id: Option<i32> },
    LibraryRead,
    LibraryUpdate { library_id: i32, admin_id: Option<i32> },
    LibraryDelete,
    BookCreate,
    BookRead,
    BookUpdate,
    BookDelete,
    InventoryAdd { library_id: i32 },
    InventoryRead { library_id: i32 },
    InventoryRemove { library_id: i32 },
    BorrowCreate { book_id: i32 },
    BorrowReturn,
    BorrowRead,
    AssignmentApprove,
    AssignmentRead,
}

impl Operation {
    /// Policies evaluated in order; the first failure wins
    pub fn policies(&self) -> Vec<Policy> {
        use ActionKind::*;

        match *self {
            Operation::LibraryCreate { admin_id } => {
                let mut policies = vec![Policy::permission(Resource::Library, Create)];
                if let Some(admin_id) = admin_id {
                    policies.push(Policy::LibraryAdminCandidate {
                        admin_id,
                        exclude_library_id: None,
                    });
                }
                policies
            }
            Operation::LibraryRead => vec![Policy::permission(Resource::Library, Read)],
            Operation::LibraryUpdate {
                library_id,
                admin_id,
            } => {
                let mut policies = vec![Policy::permission(Resource::Library, Update)];
                if let Some(admin_id) = admin_id {
                    policies.push(Policy::LibraryAdminCandidate {
                        admin_id,
                        exclude_library_id: Some(library_id),
                    });
                }
                policies
            }
            Operation::LibraryDelete => vec![Policy::permission(Resource::Library, Delete)],
            Operation::BookCreate => vec![Policy::permission(Resource::Book, Create)],
            Operation::BookRead => vec![Policy::permission(Resource::Book, Read)],
            Operation::BookUpdate => vec![Policy::permission(Resource::Book, Update)],
            Operation::BookDelete => vec![Policy::permission(Resource::Book, Delete)],
            Operation::InventoryAdd { library_id } => vec![
                Policy::permission(Resource::LibraryInventory, Create),
                Policy::InventoryOwner { library_id },
            ],
            Operation::InventoryRead { library_id } => vec![
                Policy::permission(Resource::LibraryInventory, Read),
                Policy::InventoryOwner { library_id },
            ],
            Operation::InventoryRemove { library_id } => vec![
                Policy::permission(Resource::LibraryInventory, Delete),
                Policy::InventoryOwner { library_id },
            ],
            Operation::BorrowCreate { book_id } => vec![
                Policy::permission(Resource::BookBorrower, Create),
                Policy::BorrowerAffinity { book_id },
            ],
            Operation::BorrowReturn => vec![Policy::permission(Resource::BookBorrower, Update)],
            Operation::BorrowRead => vec![Policy::permission(Resource::BookBorrower, Read)],
            Operation::AssignmentApprove => vec![Policy::permission(Resource::UserRole, Update)],
            Operation::AssignmentRead => vec![Policy::permission(Resource::UserRole, Read)],
        }
    }
}

/// Evaluate every policy of `operation` for `user_id`
pub async fn enforce(tx: &mut dyn StoreTx, user_id: i32, operation: Operation) -> AppResult<()> {
    for policy in operation.policies() {
        check(tx, user_id, &policy).await?;
    }
    Ok(())
}

/// Evaluate one policy for `user_id`
pub async fn check(tx: &mut dyn StoreTx, user_id: i32, policy: &Policy) -> AppResult<()> {
    match *policy {
        Policy::Permission { resource, action } => {
            if !permissions::resolve(tx, user_id, resource.as_str(), action).await? {
                tracing::warn!(
                    "Permission denied: user {} {} {}",
                    user_id,
                    action,
                    resource.as_str()
                );
                return Err(AppError::Forbidden(format!(
                    "Not allowed to {} {}",
                    action.as_str().to_lowercase(),
                    resource.as_str()
                )));
            }
            Ok(())
        }
        Policy::InventoryOwner { library_id } => {
            let owns = tx
                .list_user_assignments(user_id, Some(AssignmentStatus::Approved))
                .await?
                .iter()
                .any(|a| a.role == RoleName::LibraryAdmin && a.library_id == Some(library_id));
            if !owns {
                tracing::warn!(
                    "Inventory access denied: user {} is not admin of library {}",
                    user_id,
                    library_id
                );
                return Err(AppError::Forbidden(
                    "Only the admin of this library can manage its inventory".to_string(),
                ));
            }
            Ok(())
        }
        Policy::LibraryAdminCandidate {
            admin_id,
            exclude_library_id,
        } => {
            if tx.find_user(admin_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "User with id {} not found",
                    admin_id
                )));
            }
            if let Some(other) = tx.find_library_by_admin(admin_id, exclude_library_id).await? {
                return Err(AppError::Conflict(format!(
                    "User {} already administers library {}",
                    admin_id, other.id
                )));
            }
            Ok(())
        }
        Policy::BorrowerAffinity { book_id } => {
            let libraries: Vec<i32> = tx
                .list_user_assignments(user_id, Some(AssignmentStatus::Approved))
                .await?
                .iter()
                .filter(|a| a.role == RoleName::Borrower)
                .filter_map(|a| a.library_id)
                .collect();
            if libraries.is_empty() {
                return Err(AppError::Forbidden(
                    "An approved borrower role is required".to_string(),
                ));
            }

            let stocked = tx.list_book_inventory(book_id).await?;
            if stocked.is_empty() {
                return Err(AppError::NotFound(format!(
                    "Book {} is not stocked by any library",
                    book_id
                )));
            }

            // Any stocking library may match
            if !stocked.iter().any(|e| libraries.contains(&e.library_id)) {
                tracing::warn!(
                    "Borrow denied: book {} not stocked in a library of user {}",
                    book_id,
                    user_id
                );
                return Err(AppError::Forbidden(
                    "Book is not available in your library".to_string(),
                ));
            }
            Ok(())
        }
    }
}

#[derive(Clone)]
pub struct PolicyService {
    store: Arc<dyn Store>,
}

impl PolicyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Evaluate an operation in a read transaction of its own
    pub async fn authorize(&self, user_id: i32, operation: Operation) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        enforce(tx.as_mut(), user_id, operation).await
    }

    /// Fine-grained inventory guard for `library_id`
    pub async fn guard_inventory_mutation(&self, user_id: i32, library_id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        check(tx.as_mut(), user_id, &Policy::InventoryOwner { library_id }).await
    }

    /// Library admin uniqueness guard. The acting identity plays no part.
    pub async fn guard_library_admin(
        &self,
        admin_id: i32,
        exclude_library_id: Option<i32>,
    ) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        check(
            tx.as_mut(),
            admin_id,
            &Policy::LibraryAdminCandidate {
                admin_id,
                exclude_library_id,
            },
        )
        .await
    }
}
