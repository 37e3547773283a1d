//! Role and permission catalog queries

use async_trait::async_trait;

use super::PgStoreTx;
use crate::{
    error::{AppError, AppResult},
    models::{ActionKind, PermissionAction, Role, RoleName},
    repository::CatalogRepository,
};

#[async_trait]
impl CatalogRepository for PgStoreTx {
    async fn ensure_role(&mut self, name: RoleName) -> AppResult<Role> {
        sqlx::query("INSERT INTO roles (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(name.catalog_id())
            .bind(name)
            .execute(&mut *self.tx)
            .await?;

        sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::Infrastructure(format!("Role {} missing from catalog", name)))
    }

    async fn find_role(&mut self, id: i32) -> AppResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(role)
    }

    async fn list_roles(&mut self) -> AppResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(roles)
    }

    async fn ensure_permission(
        &mut self,
        resource: &str,
        action: ActionKind,
    ) -> AppResult<PermissionAction> {
        // The no-op update makes RETURNING yield the existing row too
        let permission = sqlx::query_as::<_, PermissionAction>(
            r#"
            INSERT INTO actions (resource, action)
            VALUES ($1, $2)
            ON CONFLICT (resource, action) DO UPDATE SET resource = EXCLUDED.resource
            RETURNING id, resource, action
            "#,
        )
        .bind(resource)
        .bind(action)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(permission)
    }

    async fn grant_permission(&mut self, role_id: i32, permission_id: i32) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO role_actions (role_id, action_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_role_permissions(&mut self, role_id: i32) -> AppResult<Vec<PermissionAction>> {
        let permissions = sqlx::query_as::<_, PermissionAction>(
            r#"
            SELECT a.id, a.resource, a.action
            FROM role_actions ra
            JOIN actions a ON a.id = ra.action_id
            WHERE ra.role_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(permissions)
    }
}
