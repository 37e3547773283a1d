//! Postgres store backed by sqlx transactions
//!
//! Critical sections take transaction-scoped advisory locks; the unique
//! indexes in the schema remain the final word and surface as `Conflict`.

mod assignments;
mod books;
mod borrows;
mod catalog;
mod inventory;
mod libraries;
mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use super::{LockScope, Store, StoreTx};
use crate::error::{AppError, AppResult};

/// Postgres [`Store`] implementation
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }
}

pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn lock(&mut self, scope: LockScope) -> AppResult<()> {
        let (namespace, key) = scope.key();
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(namespace)
            .bind(key)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Turn a unique-constraint violation into a `Conflict`
fn conflict_on_unique(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |err| match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        other => AppError::Database(other),
    }
}
