//! Libris lending server
//!
//! REST JSON API for a library's lending desk: borrowing, returning and
//! renewing batches of book copies under a shared lending policy, plus
//! loan dashboards for staff and members.

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
