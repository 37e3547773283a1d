//! Library (tenant) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::inventory::InventoryItem;
use super::user::UserShort;

/// Library row. `admin_id` is unique across libraries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Library {
    pub id: i32,
    pub name: String,
    pub admin_id: Option<i32>,
    pub crea_date: DateTime<Utc>,
}

/// Dropdown entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LibraryShort {
    pub id: i32,
    pub name: String,
}

impl From<&Library> for LibraryShort {
    fn from(library: &Library) -> Self {
        LibraryShort {
            id: library.id,
            name: library.name.clone(),
        }
    }
}

/// Library with its admin and stocked books
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LibraryDetails {
    #[serde(flatten)]
    pub library: Library,
    pub admin: Option<UserShort>,
    pub inventory: Vec<InventoryItem>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLibrary {
    #[validate(length(min = 1, message = "Library name is required"))]
    pub name: String,
    pub admin_id: Option<i32>,
}

/// Unset fields keep their current value
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLibrary {
    #[validate(length(min = 1, message = "Library name is required"))]
    pub name: Option<String>,
    pub admin_id: Option<i32>,
}
