//! lexrag core library
//!
//! This crate provides the foundational pieces shared by every lexrag crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - The closed set of legal domains questions are routed to

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use domain::Domain;
pub use error::{AppError, AppResult};
