//! # storage-adapters
//!
//! Process-local implementations of the `domains` ports. Everything lives in
//! `DashMap`s, so a single instance can be shared by all request handlers.

pub mod cache;
pub mod forum;

pub use cache::InMemoryCache;
pub use forum::InMemoryForum;
