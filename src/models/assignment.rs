//! Role assignments (identity -> role, optionally library-scoped)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::role::RoleName;

/// Approval workflow state. PENDING -> APPROVED is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    Approved,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "PENDING",
            AssignmentStatus::Approved => "APPROVED",
        }
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AssignmentStatus::Pending),
            "APPROVED" => Ok(AssignmentStatus::Approved),
            _ => Err(format!("Invalid assignment status: {}", s)),
        }
    }
}

impl_text_type!(AssignmentStatus);

/// Role assignment with its resolved role name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoleAssignment {
    pub id: i32,
    pub user_id: i32,
    pub role_id: i32,
    pub role: RoleName,
    pub library_id: Option<i32>,
    pub status: AssignmentStatus,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    pub fn is_approved(&self) -> bool {
        self.status == AssignmentStatus::Approved
    }
}

/// Assignment row to insert
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub user_id: i32,
    pub role_id: i32,
    pub role: RoleName,
    pub library_id: Option<i32>,
    pub status: AssignmentStatus,
}

/// Apply for an additional role
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyForRole {
    pub role_id: i32,
    pub library_id: Option<i32>,
}

/// Approve a pending assignment
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveAssignment {
    pub user_id: i32,
    pub role_id: i32,
    /// Disambiguates when the identity holds the role for several libraries
    pub library_id: Option<i32>,
}
