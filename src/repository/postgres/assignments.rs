//! Role assignment queries

use async_trait::async_trait;

use super::{conflict_on_unique, PgStoreTx};
use crate::{
    error::{AppError, AppResult},
    models::{assignment::NewAssignment, AssignmentStatus, RoleAssignment},
    repository::AssignmentsRepository,
};

const SELECT_ASSIGNMENT: &str = r#"
    SELECT ur.id, ur.user_id, ur.role_id, r.name AS role, ur.library_id,
           ur.status, ur.crea_date, ur.modif_date
    FROM user_roles ur
    JOIN roles r ON r.id = ur.role_id
"#;

#[async_trait]
impl AssignmentsRepository for PgStoreTx {
    async fn insert_assignment(&mut self, assignment: &NewAssignment) -> AppResult<RoleAssignment> {
        sqlx::query_as::<_, RoleAssignment>(
            r#"
            WITH inserted AS (
                INSERT INTO user_roles (user_id, role_id, library_id, status)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT i.id, i.user_id, i.role_id, r.name AS role, i.library_id,
                   i.status, i.crea_date, i.modif_date
            FROM inserted i
            JOIN roles r ON r.id = i.role_id
            "#,
        )
        .bind(assignment.user_id)
        .bind(assignment.role_id)
        .bind(assignment.library_id)
        .bind(assignment.status)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(conflict_on_unique("Role already requested for this library"))
    }

    async fn list_user_assignments(
        &mut self,
        user_id: i32,
        status: Option<AssignmentStatus>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let query = format!(
            "{} WHERE ur.user_id = $1 AND ($2::text IS NULL OR ur.status = $2) ORDER BY ur.id",
            SELECT_ASSIGNMENT
        );
        let assignments = sqlx::query_as::<_, RoleAssignment>(&query)
            .bind(user_id)
            .bind(status)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(assignments)
    }

    async fn list_pending_assignments(&mut self) -> AppResult<Vec<RoleAssignment>> {
        let query = format!(
            "{} WHERE ur.status = 'PENDING' ORDER BY ur.crea_date",
            SELECT_ASSIGNMENT
        );
        let assignments = sqlx::query_as::<_, RoleAssignment>(&query)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(assignments)
    }

    async fn assignment_exists_for_scope(
        &mut self,
        role_id: i32,
        library_id: i32,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_roles WHERE role_id = $1 AND library_id = $2)",
        )
        .bind(role_id)
        .bind(library_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn set_assignment_status(
        &mut self,
        id: i32,
        status: AssignmentStatus,
    ) -> AppResult<RoleAssignment> {
        let updated = sqlx::query("UPDATE user_roles SET status = $1, modif_date = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Assignment {} not found", id)));
        }

        let query = format!("{} WHERE ur.id = $1", SELECT_ASSIGNMENT);
        let assignment = sqlx::query_as::<_, RoleAssignment>(&query)
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(assignment)
    }
}
