//! Role assignment workflow: requests, bootstrap and approval

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::NewAssignment, AssignmentStatus, LibraryScope, RoleAssignment, RoleName,
    },
    repository::{LockScope, Store, StoreTx},
};

use super::policy::{self, Operation};

/// Grant the very first identity an approved SUPER_ADMIN assignment.
///
/// The caller must hold [`LockScope::Registration`] and have observed an
/// empty identity table in the same transaction.
pub async fn bootstrap_assignment(tx: &mut dyn StoreTx, user_id: i32) -> AppResult<RoleAssignment> {
    let role = tx.ensure_role(RoleName::SuperAdmin).await?;
    let assignment = tx
        .insert_assignment(&NewAssignment {
            user_id,
            role_id: role.id,
            role: RoleName::SuperAdmin,
            library_id: None,
            status: AssignmentStatus::Approved,
        })
        .await?;

    tracing::info!("Bootstrap: user {} granted SUPER_ADMIN", user_id);
    Ok(assignment)
}

/// Create a PENDING assignment after the bootstrap has happened
pub async fn create_assignment(
    tx: &mut dyn StoreTx,
    user_id: i32,
    role_id: Option<i32>,
    library_id: Option<i32>,
) -> AppResult<RoleAssignment> {
    let role_id = role_id.ok_or_else(|| AppError::InvalidInput("Role is required".to_string()))?;

    let role = tx
        .find_role(role_id)
        .await?
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid role id {}", role_id)))?;

    if role.name == RoleName::SuperAdmin {
        return Err(AppError::InvalidInput(
            "SUPER_ADMIN cannot be applied for".to_string(),
        ));
    }

    let library_id = match role.name.library_scope() {
        LibraryScope::Required => {
            let library_id = library_id.ok_or_else(|| {
                AppError::InvalidInput(format!("A library is required for role {}", role.name))
            })?;
            if tx.find_library(library_id).await?.is_none() {
                return Err(AppError::InvalidInput(format!(
                    "Invalid library id {}",
                    library_id
                )));
            }
            Some(library_id)
        }
        LibraryScope::Forbidden => {
            if library_id.is_some() {
                return Err(AppError::InvalidInput(format!(
                    "Role {} cannot be scoped to a library",
                    role.name
                )));
            }
            None
        }
    };

    if role.name == RoleName::LibraryAdmin {
        if let Some(library_id) = library_id {
            // A pending claim blocks a second claim too
            tx.lock(LockScope::LibraryAdminClaim(library_id)).await?;
            if tx.assignment_exists_for_scope(role.id, library_id).await? {
                return Err(AppError::Conflict(format!(
                    "Library {} already has an admin",
                    library_id
                )));
            }
        }
    }

    let assignment = tx
        .insert_assignment(&NewAssignment {
            user_id,
            role_id: role.id,
            role: role.name,
            library_id,
            status: AssignmentStatus::Pending,
        })
        .await?;

    tracing::info!(
        "User {} requested role {} (library {:?})",
        user_id,
        role.name,
        library_id
    );
    Ok(assignment)
}

#[derive(Clone)]
pub struct AssignmentService {
    store: Arc<dyn Store>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Request an additional role for an existing identity
    pub async fn create(
        &self,
        user_id: i32,
        role_id: Option<i32>,
        library_id: Option<i32>,
    ) -> AppResult<RoleAssignment> {
        let mut tx = self.store.begin().await?;

        if tx.find_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }

        let assignment = create_assignment(tx.as_mut(), user_id, role_id, library_id).await?;
        tx.commit().await?;
        Ok(assignment)
    }

    /// Move a PENDING assignment to APPROVED
    pub async fn approve(
        &self,
        actor_id: i32,
        user_id: i32,
        role_id: i32,
        library_id: Option<i32>,
    ) -> AppResult<RoleAssignment> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::AssignmentApprove).await?;

        let mut candidates: Vec<RoleAssignment> = tx
            .list_user_assignments(user_id, None)
            .await?
            .into_iter()
            .filter(|a| a.role_id == role_id)
            .filter(|a| library_id.map_or(true, |id| a.library_id == Some(id)))
            .collect();

        let assignment = match candidates.len() {
            0 => {
                return Err(AppError::NotFound(format!(
                    "No role {} assignment for user {}",
                    role_id, user_id
                )))
            }
            1 => candidates.remove(0),
            _ => {
                return Err(AppError::InvalidInput(
                    "User holds this role for several libraries, a library id is required"
                        .to_string(),
                ))
            }
        };

        if assignment.is_approved() {
            return Err(AppError::Conflict("Role is already approved".to_string()));
        }

        let approved = tx
            .set_assignment_status(assignment.id, AssignmentStatus::Approved)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "User {} approved role {} for user {} (library {:?})",
            actor_id,
            approved.role,
            user_id,
            approved.library_id
        );
        Ok(approved)
    }

    /// All assignments of one identity
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<RoleAssignment>> {
        let mut tx = self.store.begin().await?;
        tx.list_user_assignments(user_id, None).await
    }

    /// Assignments waiting for approval
    pub async fn list_pending(&self, actor_id: i32) -> AppResult<Vec<RoleAssignment>> {
        let mut tx = self.store.begin().await?;
        policy::enforce(tx.as_mut(), actor_id, Operation::AssignmentRead).await?;
        tx.list_pending_assignments().await
    }
}
