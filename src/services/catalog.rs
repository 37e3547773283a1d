//! Role and permission catalog: seeding and listing

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{ActionKind, Resource, Role, RoleName},
    repository::Store,
};

/// Default grants per role
pub fn default_grants(role: RoleName) -> Vec<(Resource, ActionKind)> {
    use ActionKind::*;

    let crud = |resource: Resource| ActionKind::ALL.into_iter().map(move |a| (resource, a));
    match role {
        RoleName::SuperAdmin => crud(Resource::Library)
            .chain([(Resource::UserRole, Read), (Resource::UserRole, Update)])
            .collect(),
        RoleName::LibraryAdmin => crud(Resource::Book)
            .chain(crud(Resource::LibraryInventory))
            .collect(),
        RoleName::Borrower => vec![
            (Resource::BookBorrower, Create),
            (Resource::BookBorrower, Read),
            (Resource::BookBorrower, Update),
        ],
        RoleName::Author => vec![(Resource::Book, Read)],
    }
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Ensure roles, permission actions and default grants exist.
    /// Safe to run on every startup.
    pub async fn seed(&self) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        for resource in Resource::ALL {
            for action in ActionKind::ALL {
                tx.ensure_permission(resource.as_str(), action).await?;
            }
        }

        let mut granted = 0;
        for name in RoleName::ALL {
            let role = tx.ensure_role(name).await?;
            for (resource, action) in default_grants(name) {
                let permission = tx.ensure_permission(resource.as_str(), action).await?;
                tx.grant_permission(role.id, permission.id).await?;
                granted += 1;
            }
        }

        tx.commit().await?;
        tracing::info!("Permission catalog seeded ({} grants)", granted);
        Ok(())
    }

    /// Roles a registrant may apply for
    pub async fn roles_dropdown(&self) -> AppResult<Vec<Role>> {
        let mut tx = self.store.begin().await?;
        let roles = tx.list_roles().await?;
        Ok(roles
            .into_iter()
            .filter(|r| r.name != RoleName::SuperAdmin)
            .collect())
    }
}
