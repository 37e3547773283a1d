//! Library queries

use async_trait::async_trait;

use super::{conflict_on_unique, PgStoreTx};
use crate::{
    error::{AppError, AppResult},
    models::Library,
    repository::LibrariesRepository,
};

#[async_trait]
impl LibrariesRepository for PgStoreTx {
    async fn insert_library(&mut self, name: &str, admin_id: Option<i32>) -> AppResult<Library> {
        sqlx::query_as::<_, Library>(
            "INSERT INTO libraries (name, admin_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(admin_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(conflict_on_unique("User already administers a library"))
    }

    async fn find_library(&mut self, id: i32) -> AppResult<Option<Library>> {
        let library = sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(library)
    }

    async fn find_library_by_admin(
        &mut self,
        admin_id: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<Option<Library>> {
        let library = sqlx::query_as::<_, Library>(
            r#"
            SELECT * FROM libraries
            WHERE admin_id = $1 AND ($2::int IS NULL OR id != $2)
            "#,
        )
        .bind(admin_id)
        .bind(exclude_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(library)
    }

    async fn list_libraries(&mut self) -> AppResult<Vec<Library>> {
        let libraries = sqlx::query_as::<_, Library>("SELECT * FROM libraries ORDER BY name")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(libraries)
    }

    async fn update_library(
        &mut self,
        id: i32,
        name: &str,
        admin_id: Option<i32>,
    ) -> AppResult<Library> {
        sqlx::query_as::<_, Library>(
            "UPDATE libraries SET name = $1, admin_id = $2 WHERE id = $3 RETURNING *",
        )
        .bind(name)
        .bind(admin_id)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(conflict_on_unique("User already administers a library"))?
        .ok_or_else(|| AppError::NotFound(format!("Library {} not found", id)))
    }

    async fn delete_library(&mut self, id: i32) -> AppResult<()> {
        // Inventory and scoped assignments cascade
        let result = sqlx::query("DELETE FROM libraries WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Library {} not found", id)));
        }
        Ok(())
    }
}
