pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

pub use app::AppState;
pub use config::AppConfig;
pub use error::{AppError, Result};
