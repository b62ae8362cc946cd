// Campus Forum - moderation core for a university discussion forum

// HTTP surface
pub mod api;
pub mod app_state;
pub mod config;

// Core types and primitives
pub mod core;

// Storage, caching, identity and middleware
pub mod infrastructure;

// Domain documents and the moderation engine over them
pub mod models;
pub mod moderation;
pub mod services;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
