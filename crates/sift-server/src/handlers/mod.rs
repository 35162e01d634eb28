//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod budget;
pub mod categorize;
pub mod health;
pub mod import;
pub mod reports;
pub mod training;
pub mod transactions;

// Re-export all handlers for use in router
pub use budget::*;
pub use categorize::*;
pub use health::*;
pub use import::*;
pub use reports::*;
pub use training::*;
pub use transactions::*;
