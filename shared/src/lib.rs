//! Shared types for the menu server
//!
//! Domain models and the unified error/response types used by the server
//! crate and mirrored by the web client.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
