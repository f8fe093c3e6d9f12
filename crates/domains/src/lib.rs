//! forum-board/crates/domains/src/lib.rs
//!
//! Domain models and port definitions for the forum page-load pipeline.
//! Nothing in here performs I/O; adapters implement the ports.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
