// Shelfmark - book review platform backend.

// HTTP surface
pub mod api;

// Application wiring
pub mod app_state;
pub mod config;

// Identity boundary - token resolution and credential digests
pub mod identity;

// Domain entities, payloads, and read models
pub mod models;

// Business services, including the rating aggregator
pub mod services;

// Persistence boundary and backends
pub mod store;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
