//! Role catalog

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// The fixed set of role identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    SuperAdmin,
    LibraryAdmin,
    Author,
    Borrower,
}

/// Whether an assignment of a role must carry a library id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryScope {
    Required,
    Forbidden,
}

impl RoleName {
    pub const ALL: [RoleName; 4] = [
        RoleName::SuperAdmin,
        RoleName::LibraryAdmin,
        RoleName::Author,
        RoleName::Borrower,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "SUPER_ADMIN",
            RoleName::LibraryAdmin => "LIBRARY_ADMIN",
            RoleName::Author => "AUTHOR",
            RoleName::Borrower => "BORROWER",
        }
    }

    /// Fixed row id in the `roles` table
    pub fn catalog_id(&self) -> i32 {
        match self {
            RoleName::SuperAdmin => 1,
            RoleName::LibraryAdmin => 2,
            RoleName::Author => 3,
            RoleName::Borrower => 4,
        }
    }

    pub fn library_scope(&self) -> LibraryScope {
        match self {
            RoleName::LibraryAdmin | RoleName::Borrower => LibraryScope::Required,
            RoleName::SuperAdmin | RoleName::Author => LibraryScope::Forbidden,
        }
    }
}

impl std::str::FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(RoleName::SuperAdmin),
            "LIBRARY_ADMIN" => Ok(RoleName::LibraryAdmin),
            "AUTHOR" => Ok(RoleName::Author),
            "BORROWER" => Ok(RoleName::Borrower),
            _ => Err(format!("Invalid role name: {}", s)),
        }
    }
}

impl_text_type!(RoleName);

/// Role row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Role {
    pub id: i32,
    pub name: RoleName,
}
