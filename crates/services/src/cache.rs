//! Cache keys and the typed get-or-set helper used on top of the [`Cache`] port.

use std::future::Future;

use domains::{Cache, DomainError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Snapshot of the active users list; dropped whenever a page load reports
/// `active_update`.
pub const USERS_ONLINE_STATUS: &str = "users_online_status";

/// Per-user list of granted admin pages.
pub fn admin_page_access(user_id: i64) -> String {
    format!("admin_page_access_{user_id}")
}

/// Returns the cached value under `key`, or computes it with `load`, stores it
/// and returns it.
///
/// A cached value that no longer deserializes into `T` is treated as a miss
/// and overwritten.
pub async fn get_or_set<T, F, Fut>(cache: &dyn Cache, key: &str, load: F) -> Result<T, DomainError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    if let Some(cached) = cache.get(key).await? {
        match serde_json::from_value(cached) {
            Ok(value) => return Ok(value),
            Err(err) => warn!(key, error = %err, "discarding undecodable cache entry"),
        }
    }

    let value = load().await?;
    cache.set(key, serde_json::to_value(&value)?).await?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockCache;
    use serde_json::json;

    #[tokio::test]
    async fn hit_skips_the_loader() {
        let mut cache = MockCache::new();
        cache
            .expect_get()
            .withf(|key| key == "admin_page_access_4")
            .returning(|_| Ok(Some(json!([1, 2, 3]))));
        cache.expect_set().never();

        let value: Vec<u8> = get_or_set(&cache, &admin_page_access(4), || async {
            Err(DomainError::Validation("loader must not run on a hit".into()))
        })
        .await
        .unwrap();

        assert_eq!(value, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn miss_loads_and_stores() {
        let mut cache = MockCache::new();
        cache.expect_get().returning(|_| Ok(None));
        cache
            .expect_set()
            .withf(|key, value| key == "k" && *value == json!(["a"]))
            .times(1)
            .returning(|_, _| Ok(()));

        let value: Vec<String> = get_or_set(&cache, "k", || async { Ok(vec!["a".to_string()]) })
            .await
            .unwrap();

        assert_eq!(value, vec!["a"]);
    }

    #[tokio::test]
    async fn stale_shape_is_reloaded() {
        let mut cache = MockCache::new();
        cache.expect_get().returning(|_| Ok(Some(json!("not a list"))));
        cache.expect_set().times(1).returning(|_, _| Ok(()));

        let value: Vec<i64> = get_or_set(&cache, "k", || async { Ok(vec![9]) }).await.unwrap();

        assert_eq!(value, vec![9]);
    }
}
