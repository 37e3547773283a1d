//! Identity queries

use async_trait::async_trait;

use super::{conflict_on_unique, PgStoreTx};
use crate::{
    error::AppResult,
    models::{user::NewUser, User},
    repository::UsersRepository,
};

#[async_trait]
impl UsersRepository for PgStoreTx {
    async fn count_users(&mut self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn insert_user(&mut self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(conflict_on_unique("Email already exists"))
    }

    async fn find_user(&mut self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn set_user_token(&mut self, id: i32, token: Option<&str>) -> AppResult<()> {
        sqlx::query("UPDATE users SET token = $1 WHERE id = $2")
            .bind(token)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}
