//! Permission resolution against the role/permission catalog

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{ActionKind, AssignmentStatus},
    repository::{Store, StoreTx},
};

/// Whether `user_id` may perform `action` on `resource`.
///
/// Walks the identity's APPROVED assignments and their roles' grants and
/// matches the pair exactly. Library scope is not considered here. No
/// approved assignment, or no matching grant, means deny.
pub async fn resolve(
    tx: &mut dyn StoreTx,
    user_id: i32,
    resource: &str,
    action: ActionKind,
) -> AppResult<bool> {
    let assignments = tx
        .list_user_assignments(user_id, Some(AssignmentStatus::Approved))
        .await?;

    let mut role_ids: Vec<i32> = assignments.iter().map(|a| a.role_id).collect();
    role_ids.sort_unstable();
    role_ids.dedup();

    for role_id in role_ids {
        let permissions = tx.list_role_permissions(role_id).await?;
        if permissions.iter().any(|p| p.matches(resource, action)) {
            return Ok(true);
        }
    }

    Ok(false)
}

#[derive(Clone)]
pub struct PermissionService {
    store: Arc<dyn Store>,
}

impl PermissionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolve a permission in a read transaction of its own.
    /// Store failures propagate; they are never turned into a deny.
    pub async fn is_allowed(
        &self,
        user_id: i32,
        resource: &str,
        action: ActionKind,
    ) -> AppResult<bool> {
        let mut tx = self.store.begin().await?;
        resolve(tx.as_mut(), user_id, resource, action).await
    }
}
