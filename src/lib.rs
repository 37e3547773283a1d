//! Lending server
//!
//! A multi-tenant library lending REST JSON API: libraries, books, borrowers
//! and administrators, gated by a role/permission model with an approval
//! workflow.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
