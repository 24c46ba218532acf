//! Data models
//!
//! Shared between menu-server and the web client (via API).

pub mod cart;
pub mod order;
pub mod product;

// Re-exports
pub use cart::*;
pub use order::*;
pub use product::*;
