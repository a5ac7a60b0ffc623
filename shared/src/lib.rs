//! Shared types for the storefront services
//!
//! Common types used across the workspace: the unified error system,
//! domain models, queue message payloads, and small utilities.

pub mod error;
pub mod models;
pub mod queue;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::Paginated;
