//! Repository layer: persistence ports and their adapters
//!
//! Services never talk to a database directly. They open a transaction with
//! [`Store::begin`], run point lookups and writes through [`StoreTx`], and
//! commit. Dropping an uncommitted transaction rolls it back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    error::AppResult,
    models::{
        assignment::NewAssignment,
        book::{CreateBook, UpdateBook},
        user::NewUser,
        ActionKind, AssignmentStatus, Book, BorrowRecord, BorrowStatus, InventoryEntry, Library,
        PermissionAction, Role, RoleAssignment, RoleName, User,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Critical sections serialised by [`StoreTx::lock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockScope {
    /// Identity creation and the first-identity bootstrap
    Registration,
    /// LIBRARY_ADMIN claims on one library
    LibraryAdminClaim(i32),
    /// Library.admin_id assignment of one identity
    AdminSeat(i32),
    /// Borrow creation by one identity
    Borrower(i32),
}

impl LockScope {
    /// (namespace, key) pair for two-key advisory locks
    pub fn key(&self) -> (i32, i32) {
        match *self {
            LockScope::Registration => (1, 0),
            LockScope::LibraryAdminClaim(library_id) => (2, library_id),
            LockScope::AdminSeat(user_id) => (3, user_id),
            LockScope::Borrower(user_id) => (4, user_id),
        }
    }
}

#[async_trait]
pub trait UsersRepository: Send {
    async fn count_users(&mut self) -> AppResult<i64>;
    async fn insert_user(&mut self, user: &NewUser) -> AppResult<User>;
    async fn find_user(&mut self, id: i32) -> AppResult<Option<User>>;
    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>>;
    async fn set_user_token(&mut self, id: i32, token: Option<&str>) -> AppResult<()>;
}

#[async_trait]
pub trait CatalogRepository: Send {
    /// Insert the role if missing, return it either way
    async fn ensure_role(&mut self, name: RoleName) -> AppResult<Role>;
    async fn find_role(&mut self, id: i32) -> AppResult<Option<Role>>;
    async fn list_roles(&mut self) -> AppResult<Vec<Role>>;
    /// Insert the (resource, action) pair if missing, return it either way
    async fn ensure_permission(
        &mut self,
        resource: &str,
        action: ActionKind,
    ) -> AppResult<PermissionAction>;
    /// Idempotent; a pair is stored at most once
    async fn grant_permission(&mut self, role_id: i32, permission_id: i32) -> AppResult<()>;
    async fn list_role_permissions(&mut self, role_id: i32) -> AppResult<Vec<PermissionAction>>;
}

#[async_trait]
pub trait AssignmentsRepository: Send {
    async fn insert_assignment(&mut self, assignment: &NewAssignment) -> AppResult<RoleAssignment>;
    /// All assignments of an identity, optionally filtered by status
    async fn list_user_assignments(
        &mut self,
        user_id: i32,
        status: Option<AssignmentStatus>,
    ) -> AppResult<Vec<RoleAssignment>>;
    async fn list_pending_assignments(&mut self) -> AppResult<Vec<RoleAssignment>>;
    /// Any assignment, whatever its status, of `role_id` scoped to `library_id`
    async fn assignment_exists_for_scope(&mut self, role_id: i32, library_id: i32)
        -> AppResult<bool>;
    async fn set_assignment_status(
        &mut self,
        id: i32,
        status: AssignmentStatus,
    ) -> AppResult<RoleAssignment>;
}

#[async_trait]
pub trait LibrariesRepository: Send {
    async fn insert_library(&mut self, name: &str, admin_id: Option<i32>) -> AppResult<Library>;
    async fn find_library(&mut self, id: i32) -> AppResult<Option<Library>>;
    /// Library administered by `admin_id`, ignoring `exclude_id`
    async fn find_library_by_admin(
        &mut self,
        admin_id: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<Option<Library>>;
    async fn list_libraries(&mut self) -> AppResult<Vec<Library>>;
    async fn update_library(
        &mut self,
        id: i32,
        name: &str,
        admin_id: Option<i32>,
    ) -> AppResult<Library>;
    /// Removes the library with its inventory and library-scoped assignments
    async fn delete_library(&mut self, id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait BooksRepository: Send {
    async fn insert_book(&mut self, book: &CreateBook) -> AppResult<Book>;
    async fn find_book(&mut self, id: i32) -> AppResult<Option<Book>>;
    async fn list_books(&mut self) -> AppResult<Vec<Book>>;
    async fn update_book(&mut self, id: i32, book: &UpdateBook) -> AppResult<Book>;
    /// Removes the book with its inventory entries and borrow history
    async fn delete_book(&mut self, id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait InventoryRepository: Send {
    async fn insert_inventory(&mut self, library_id: i32, book_id: i32)
        -> AppResult<InventoryEntry>;
    async fn find_inventory(
        &mut self,
        library_id: i32,
        book_id: i32,
    ) -> AppResult<Option<InventoryEntry>>;
    async fn list_book_inventory(&mut self, book_id: i32) -> AppResult<Vec<InventoryEntry>>;
    async fn list_library_inventory(&mut self, library_id: i32)
        -> AppResult<Vec<InventoryEntry>>;
    async fn delete_inventory(&mut self, id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait BorrowsRepository: Send {
    async fn insert_borrow(
        &mut self,
        user_id: i32,
        book_id: i32,
        charge: Decimal,
        borrow_date: DateTime<Utc>,
    ) -> AppResult<BorrowRecord>;
    async fn find_active_borrow(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> AppResult<Option<BorrowRecord>>;
    /// Record matching id, owner and status
    async fn find_borrow(
        &mut self,
        id: i32,
        user_id: i32,
        status: BorrowStatus,
    ) -> AppResult<Option<BorrowRecord>>;
    async fn mark_returned(&mut self, id: i32, return_date: DateTime<Utc>)
        -> AppResult<BorrowRecord>;
    async fn list_user_borrows(&mut self, user_id: i32) -> AppResult<Vec<BorrowRecord>>;
    async fn list_book_borrows(&mut self, book_id: i32) -> AppResult<Vec<BorrowRecord>>;
}

/// One open transaction against the store
#[async_trait]
pub trait StoreTx:
    UsersRepository
    + CatalogRepository
    + AssignmentsRepository
    + LibrariesRepository
    + BooksRepository
    + InventoryRepository
    + BorrowsRepository
    + Send
{
    /// Serialise the rest of this transaction against others holding `scope`.
    /// Released on commit or rollback.
    async fn lock(&mut self, scope: LockScope) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Transactional store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;
}
