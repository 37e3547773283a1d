//! Permission actions: (resource, action-kind) pairs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// CRUD action kinds a permission can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Create,
    Read,
    Update,
    Delete,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Create,
        ActionKind::Read,
        ActionKind::Update,
        ActionKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "CREATE",
            ActionKind::Read => "READ",
            ActionKind::Update => "UPDATE",
            ActionKind::Delete => "DELETE",
        }
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(ActionKind::Create),
            "READ" => Ok(ActionKind::Read),
            "UPDATE" => Ok(ActionKind::Update),
            "DELETE" => Ok(ActionKind::Delete),
            _ => Err(format!("Invalid action kind: {}", s)),
        }
    }
}

impl_text_type!(ActionKind);

/// Resource tags known to the permission catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Resource {
    User,
    Book,
    UserRole,
    BookBorrower,
    Library,
    LibraryInventory,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::User,
        Resource::Book,
        Resource::UserRole,
        Resource::BookBorrower,
        Resource::Library,
        Resource::LibraryInventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::User => "User",
            Resource::Book => "Book",
            Resource::UserRole => "UserRole",
            Resource::BookBorrower => "BookBorrower",
            Resource::Library => "Library",
            Resource::LibraryInventory => "LibraryInventory",
        }
    }
}

/// A (resource, action-kind) identity in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PermissionAction {
    pub id: i32,
    /// Free-form resource tag
    pub resource: String,
    pub action: ActionKind,
}

impl PermissionAction {
    /// Exact match, no wildcard or hierarchy
    pub fn matches(&self, resource: &str, action: ActionKind) -> bool {
        self.resource == resource && self.action == action
    }
}
