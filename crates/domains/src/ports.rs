//! # Ports
//!
//! Any adapter must implement these traits to be wired into the page-load
//! pipeline. With the `testing` feature, mockall generates a `MockXxx` for each.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;
use crate::models::{ActiveUser, ForumPage, PageLoadRecord, PageLoadRequest};

/// Lookup/upsert of the per-request tracking record.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PageLoadStore: Send + Sync {
    /// Resolves the page load for `request` under `request.user_id`
    /// (guest when `None`). `Ok(None)` means the identity could not be
    /// resolved, which the caller may retry.
    async fn lookup(&self, request: &PageLoadRequest) -> Result<Option<PageLoadRecord>>;
}

/// Creates the forum-side user for a membership identity when missing.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserProvisioner: Send + Sync {
    /// `true` if the user exists afterwards, `false` if creation failed.
    async fn ensure_user_exists(&self, identity: &str, board_id: i32) -> Result<bool>;
}

/// Shared key/value cache.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    /// Idempotent; removing a missing key is not an error.
    async fn remove(&self, key: &str);
}

/// Read side of the active-session table.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ActiveUserRepo: Send + Sync {
    async fn list_active(&self, board_id: i32) -> Result<Vec<ActiveUser>>;
}

/// Admin pages a (non host-admin) user was granted.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AdminPageAccessRepo: Send + Sync {
    async fn list_pages(&self, user_id: i64) -> Result<Vec<ForumPage>>;
}
