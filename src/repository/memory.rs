//! In-memory store used by tests and local runs
//!
//! A transaction holds the store mutex for its whole lifetime and works on a
//! copy of the state, so transactions are fully serialised and an
//! uncommitted transaction leaves no trace. Uniqueness rules mirror the
//! Postgres schema.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    AssignmentsRepository, BooksRepository, BorrowsRepository, CatalogRepository,
    InventoryRepository, LibrariesRepository, LockScope, Store, StoreTx, UsersRepository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::NewAssignment,
        book::{CreateBook, UpdateBook},
        user::NewUser,
        ActionKind, AssignmentStatus, Book, BorrowRecord, BorrowStatus, InventoryEntry, Library,
        PermissionAction, Role, RoleAssignment, RoleName, User,
    },
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    sequence: i32,
    users: Vec<User>,
    roles: Vec<Role>,
    permissions: Vec<PermissionAction>,
    grants: Vec<(i32, i32)>,
    assignments: Vec<RoleAssignment>,
    libraries: Vec<Library>,
    books: Vec<Book>,
    inventory: Vec<InventoryEntry>,
    borrows: Vec<BorrowRecord>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.sequence += 1;
        self.sequence
    }
}

/// In-memory [`Store`] implementation
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock(&mut self, _scope: LockScope) -> AppResult<()> {
        // Already exclusive for the lifetime of the transaction
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl UsersRepository for MemoryTx {
    async fn count_users(&mut self) -> AppResult<i64> {
        Ok(self.working.users.len() as i64)
    }

    async fn insert_user(&mut self, user: &NewUser) -> AppResult<User> {
        if self.working.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        let row = User {
            id: self.working.next_id(),
            name: user.name.clone(),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            token: None,
            crea_date: Utc::now(),
        };
        self.working.users.push(row.clone());
        Ok(row)
    }

    async fn find_user(&mut self, id: i32) -> AppResult<Option<User>> {
        Ok(self.working.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        Ok(self.working.users.iter().find(|u| u.email == email).cloned())
    }

    async fn set_user_token(&mut self, id: i32, token: Option<&str>) -> AppResult<()> {
        let user = self
            .working
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;
        user.token = token.map(str::to_string);
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryTx {
    async fn ensure_role(&mut self, name: RoleName) -> AppResult<Role> {
        if let Some(role) = self.working.roles.iter().find(|r| r.name == name) {
            return Ok(role.clone());
        }
        let role = Role {
            id: self.working.next_id(),
            name,
        };
        self.working.roles.push(role.clone());
        Ok(role)
    }

    async fn find_role(&mut self, id: i32) -> AppResult<Option<Role>> {
        Ok(self.working.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn list_roles(&mut self) -> AppResult<Vec<Role>> {
        Ok(self.working.roles.clone())
    }

    async fn ensure_permission(
        &mut self,
        resource: &str,
        action: ActionKind,
    ) -> AppResult<PermissionAction> {
        if let Some(permission) = self
            .working
            .permissions
            .iter()
            .find(|p| p.matches(resource, action))
        {
            return Ok(permission.clone());
        }
        let permission = PermissionAction {
            id: self.working.next_id(),
            resource: resource.to_string(),
            action,
        };
        self.working.permissions.push(permission.clone());
        Ok(permission)
    }

    async fn grant_permission(&mut self, role_id: i32, permission_id: i32) -> AppResult<()> {
        if !self.working.grants.contains(&(role_id, permission_id)) {
            self.working.grants.push((role_id, permission_id));
        }
        Ok(())
    }

    async fn list_role_permissions(&mut self, role_id: i32) -> AppResult<Vec<PermissionAction>> {
        let state = &self.working;
        Ok(state
            .permissions
            .iter()
            .filter(|p| state.grants.contains(&(role_id, p.id)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssignmentsRepository for MemoryTx {
    async fn insert_assignment(&mut self, assignment: &NewAssignment) -> AppResult<RoleAssignment> {
        let duplicate = self.working.assignments.iter().any(|a| {
            a.user_id == assignment.user_id
                && a.role_id == assignment.role_id
                && a.library_id == assignment.library_id
        });
        if duplicate {
            return Err(AppError::Conflict("Role already requested".to_string()));
        }
        if assignment.role == RoleName::LibraryAdmin {
            let claimed = self.working.assignments.iter().any(|a| {
                a.role == RoleName::LibraryAdmin && a.library_id == assignment.library_id
            });
            if claimed {
                return Err(AppError::Conflict("Library already has an admin".to_string()));
            }
        }
        let row = RoleAssignment {
            id: self.working.next_id(),
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            role: assignment.role,
            library_id: assignment.library_id,
            status: assignment.status,
            crea_date: Utc::now(),
            modif_date: None,
        };
        self.working.assignments.push(row.clone());
        Ok(row)
    }

    async fn list_user_assignments(
        &mut self,
        user_id: i32,
        status: Option<AssignmentStatus>,
    ) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .working
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id && status.map_or(true, |s| a.status == s))
            .cloned()
            .collect())
    }

    async fn list_pending_assignments(&mut self) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .working
            .assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Pending)
            .cloned()
            .collect())
    }

    async fn assignment_exists_for_scope(
        &mut self,
        role_id: i32,
        library_id: i32,
    ) -> AppResult<bool> {
        Ok(self
            .working
            .assignments
            .iter()
            .any(|a| a.role_id == role_id && a.library_id == Some(library_id)))
    }

    async fn set_assignment_status(
        &mut self,
        id: i32,
        status: AssignmentStatus,
    ) -> AppResult<RoleAssignment> {
        let assignment = self
            .working
            .assignments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;
        assignment.status = status;
        assignment.modif_date = Some(Utc::now());
        Ok(assignment.clone())
    }
}

#[async_trait]
impl LibrariesRepository for MemoryTx {
    async fn insert_library(&mut self, name: &str, admin_id: Option<i32>) -> AppResult<Library> {
        if let Some(admin_id) = admin_id {
            if self.find_library_by_admin(admin_id, None).await?.is_some() {
                return Err(AppError::Conflict("User already administers a library".to_string()));
            }
        }
        let library = Library {
            id: self.working.next_id(),
            name: name.to_string(),
            admin_id,
            crea_date: Utc::now(),
        };
        self.working.libraries.push(library.clone());
        Ok(library)
    }

    async fn find_library(&mut self, id: i32) -> AppResult<Option<Library>> {
        Ok(self.working.libraries.iter().find(|l| l.id == id).cloned())
    }

    async fn find_library_by_admin(
        &mut self,
        admin_id: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<Option<Library>> {
        Ok(self
            .working
            .libraries
            .iter()
            .find(|l| l.admin_id == Some(admin_id) && Some(l.id) != exclude_id)
            .cloned())
    }

    async fn list_libraries(&mut self) -> AppResult<Vec<Library>> {
        Ok(self.working.libraries.clone())
    }

    async fn update_library(
        &mut self,
        id: i32,
        name: &str,
        admin_id: Option<i32>,
    ) -> AppResult<Library> {
        if let Some(admin_id) = admin_id {
            if self.find_library_by_admin(admin_id, Some(id)).await?.is_some() {
                return Err(AppError::Conflict("User already administers a library".to_string()));
            }
        }
        let library = self
            .working
            .libraries
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Library {} not found", id)))?;
        library.name = name.to_string();
        library.admin_id = admin_id;
        Ok(library.clone())
    }

    async fn delete_library(&mut self, id: i32) -> AppResult<()> {
        let before = self.working.libraries.len();
        self.working.libraries.retain(|l| l.id != id);
        if self.working.libraries.len() == before {
            return Err(AppError::NotFound(format!("Library {} not found", id)));
        }
        self.working.inventory.retain(|e| e.library_id != id);
        self.working.assignments.retain(|a| a.library_id != Some(id));
        Ok(())
    }
}

#[async_trait]
impl BooksRepository for MemoryTx {
    async fn insert_book(&mut self, book: &CreateBook) -> AppResult<Book> {
        let row = Book {
            id: self.working.next_id(),
            title: book.title.clone(),
            author_id: book.author_id,
            price: book.price,
            cover_url: book.cover_url.clone(),
            crea_date: Utc::now(),
        };
        self.working.books.push(row.clone());
        Ok(row)
    }

    async fn find_book(&mut self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.working.books.iter().find(|b| b.id == id).cloned())
    }

    async fn list_books(&mut self) -> AppResult<Vec<Book>> {
        Ok(self.working.books.clone())
    }

    async fn update_book(&mut self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let book = self
            .working
            .books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        if let Some(ref title) = data.title {
            book.title = title.clone();
        }
        if let Some(author_id) = data.author_id {
            book.author_id = author_id;
        }
        if let Some(price) = data.price {
            book.price = price;
        }
        if let Some(ref cover_url) = data.cover_url {
            book.cover_url = Some(cover_url.clone());
        }
        Ok(book.clone())
    }

    async fn delete_book(&mut self, id: i32) -> AppResult<()> {
        let before = self.working.books.len();
        self.working.books.retain(|b| b.id != id);
        if self.working.books.len() == before {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        self.working.inventory.retain(|e| e.book_id != id);
        self.working.borrows.retain(|b| b.book_id != id);
        Ok(())
    }
}

#[async_trait]
impl InventoryRepository for MemoryTx {
    async fn insert_inventory(
        &mut self,
        library_id: i32,
        book_id: i32,
    ) -> AppResult<InventoryEntry> {
        if self.find_inventory(library_id, book_id).await?.is_some() {
            return Err(AppError::Conflict("Book already in inventory".to_string()));
        }
        let entry = InventoryEntry {
            id: self.working.next_id(),
            library_id,
            book_id,
            added_date: Utc::now(),
        };
        self.working.inventory.push(entry.clone());
        Ok(entry)
    }

    async fn find_inventory(
        &mut self,
        library_id: i32,
        book_id: i32,
    ) -> AppResult<Option<InventoryEntry>> {
        Ok(self
            .working
            .inventory
            .iter()
            .find(|e| e.library_id == library_id && e.book_id == book_id)
            .cloned())
    }

    async fn list_book_inventory(&mut self, book_id: i32) -> AppResult<Vec<InventoryEntry>> {
        Ok(self
            .working
            .inventory
            .iter()
            .filter(|e| e.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn list_library_inventory(
        &mut self,
        library_id: i32,
    ) -> AppResult<Vec<InventoryEntry>> {
        Ok(self
            .working
            .inventory
            .iter()
            .filter(|e| e.library_id == library_id)
            .cloned()
            .collect())
    }

    async fn delete_inventory(&mut self, id: i32) -> AppResult<()> {
        self.working.inventory.retain(|e| e.id != id);
        Ok(())
    }
}

#[async_trait]
impl BorrowsRepository for MemoryTx {
    async fn insert_borrow(
        &mut self,
        user_id: i32,
        book_id: i32,
        charge: Decimal,
        borrow_date: DateTime<Utc>,
    ) -> AppResult<BorrowRecord> {
        if self.find_active_borrow(user_id, book_id).await?.is_some() {
            return Err(AppError::Conflict("Book already borrowed".to_string()));
        }
        let record = BorrowRecord {
            id: self.working.next_id(),
            user_id,
            book_id,
            status: BorrowStatus::Borrowed,
            borrow_date,
            return_date: None,
            charge,
        };
        self.working.borrows.push(record.clone());
        Ok(record)
    }

    async fn find_active_borrow(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> AppResult<Option<BorrowRecord>> {
        Ok(self
            .working
            .borrows
            .iter()
            .find(|b| b.user_id == user_id && b.book_id == book_id && b.is_active())
            .cloned())
    }

    async fn find_borrow(
        &mut self,
        id: i32,
        user_id: i32,
        status: BorrowStatus,
    ) -> AppResult<Option<BorrowRecord>> {
        Ok(self
            .working
            .borrows
            .iter()
            .find(|b| b.id == id && b.user_id == user_id && b.status == status)
            .cloned())
    }

    async fn mark_returned(
        &mut self,
        id: i32,
        return_date: DateTime<Utc>,
    ) -> AppResult<BorrowRecord> {
        let record = self
            .working
            .borrows
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Borrow record {} not found", id)))?;
        record.status = BorrowStatus::Returned;
        record.return_date = Some(return_date);
        Ok(record.clone())
    }

    async fn list_user_borrows(&mut self, user_id: i32) -> AppResult<Vec<BorrowRecord>> {
        Ok(self
            .working
            .borrows
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_book_borrows(&mut self, book_id: i32) -> AppResult<Vec<BorrowRecord>> {
        Ok(self
            .working
            .borrows
            .iter()
            .filter(|b| b.book_id == book_id)
            .cloned()
            .collect())
    }
}
