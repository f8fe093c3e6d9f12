//! # Page-load resolution
//!
//! Runs once per inbound page request, before the page itself. Resolves the
//! tracking record for the request's session, retrying the authenticated
//! identity a bounded number of times before falling back to the board's
//! guest user, and drops the cached online-users snapshot whenever the store
//! reports that the active list changed.
//!
//! Logging of fatal failures and the user-facing reaction to them belong to
//! the caller (see the `api-adapters` middleware).

use std::sync::Arc;

use domains::{
    Cache, DomainError, PageData, PageLoadRecord, PageLoadRequest, PageLoadStore, UserProvisioner,
    ACTIVE_UPDATE,
};
use thiserror::Error;
use tracing::debug;

use crate::cache::USERS_ONLINE_STATUS;

/// Fatal outcomes of [`PageLoadResolver::resolve`]. Lookup misses are not
/// errors; they drive the retry and fallback policy.
#[derive(Error, Debug)]
pub enum PageLoadError {
    /// The identity has no forum user and one could not be created.
    /// Never retried.
    #[error("user provisioning failed for '{identity}' on board {board_id}")]
    ProvisioningFailure { identity: String, board_id: i32 },

    /// No record even for the guest identity.
    #[error("guest identity lookup failed for session '{session_id}' after {attempts} attempt(s)")]
    ResolutionExhausted { session_id: String, attempts: u32 },

    /// The store or provisioner itself failed.
    #[error("page load backend error: {0}")]
    Store(#[from] DomainError),
}

/// How hard to try the authenticated identity before going guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverPolicy {
    pub identity_attempts: u32,
}

impl ResolverPolicy {
    /// At least one attempt is always made.
    pub fn new(identity_attempts: u32) -> Self {
        Self {
            identity_attempts: identity_attempts.max(1),
        }
    }
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Stateless across calls; one instance is shared by every request.
pub struct PageLoadResolver {
    store: Arc<dyn PageLoadStore>,
    provisioner: Arc<dyn UserProvisioner>,
    cache: Arc<dyn Cache>,
    policy: ResolverPolicy,
}

impl PageLoadResolver {
    pub fn new(
        store: Arc<dyn PageLoadStore>,
        provisioner: Arc<dyn UserProvisioner>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            store,
            provisioner,
            cache,
            policy: ResolverPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResolverPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ResolverPolicy {
        self.policy
    }

    /// Resolves the page load for `request` and merges the record into `data`.
    ///
    /// On success `data` holds every field of the record, including
    /// `active_update`. When that flag is set the users-online cache entry is
    /// removed.
    ///
    /// # Errors
    /// [`PageLoadError::ProvisioningFailure`] as soon as the provisioner gives
    /// up on the identity, [`PageLoadError::ResolutionExhausted`] when even
    /// the guest lookup misses, [`PageLoadError::Store`] for backend failures.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(session_id = %request.session_id, board_id = request.board_id)
    )]
    pub async fn resolve(
        &self,
        request: &PageLoadRequest,
        data: &mut PageData,
    ) -> Result<(), PageLoadError> {
        let record = self.lookup_with_fallback(request).await?;

        data.merge(record);

        if data.get_bool(ACTIVE_UPDATE) {
            self.cache.remove(USERS_ONLINE_STATUS).await;
        }

        Ok(())
    }

    async fn lookup_with_fallback(
        &self,
        request: &PageLoadRequest,
    ) -> Result<PageLoadRecord, PageLoadError> {
        let mut user_key = request.user_id.clone();
        let mut tries = 0;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let lookup = request.as_identity(user_key.clone());
            if let Some(record) = self.store.lookup(&lookup).await? {
                return Ok(record);
            }

            let Some(identity) = user_key.as_deref() else {
                return Err(PageLoadError::ResolutionExhausted {
                    session_id: request.session_id.clone(),
                    attempts,
                });
            };

            if !self
                .provisioner
                .ensure_user_exists(identity, request.board_id)
                .await?
            {
                return Err(PageLoadError::ProvisioningFailure {
                    identity: identity.to_string(),
                    board_id: request.board_id,
                });
            }

            tries += 1;
            if tries < self.policy.identity_attempts {
                debug!(attempt = tries, "page load miss, retrying identity");
                continue;
            }

            // probably no permissions, look the session up as guest instead
            debug!(attempts = tries, "identity unresolved, falling back to guest");
            user_key = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockCache, MockPageLoadStore, MockUserProvisioner};
    use tokio_test::{assert_err, assert_ok};

    fn authenticated() -> PageLoadRequest {
        let mut request = PageLoadRequest::new("sess-1", 1);
        request.user_id = Some("alice".into());
        request.route = "/topics".into();
        request
    }

    fn record(user_id: i64, active_update: bool) -> PageLoadRecord {
        PageLoadRecord::new(active_update).with("user_id", user_id)
    }

    fn resolver(
        store: MockPageLoadStore,
        provisioner: MockUserProvisioner,
        cache: MockCache,
    ) -> PageLoadResolver {
        PageLoadResolver::new(Arc::new(store), Arc::new(provisioner), Arc::new(cache))
    }

    #[tokio::test]
    async fn first_hit_returns_after_one_lookup() {
        let mut store = MockPageLoadStore::new();
        store
            .expect_lookup()
            .withf(|r| r.user_id.as_deref() == Some("alice"))
            .times(1)
            .returning(|_| Ok(Some(record(5, false))));
        let mut provisioner = MockUserProvisioner::new();
        provisioner.expect_ensure_user_exists().never();
        let mut cache = MockCache::new();
        cache.expect_remove().never();

        let mut data = PageData::new();
        assert_ok!(resolver(store, provisioner, cache).resolve(&authenticated(), &mut data).await);

        assert_eq!(data.get_i64("user_id"), Some(5));
        assert!(!data.get_bool(ACTIVE_UPDATE));
    }

    #[tokio::test]
    async fn falls_back_to_guest_on_third_lookup() {
        let mut store = MockPageLoadStore::new();
        store
            .expect_lookup()
            .withf(|r| r.user_id.is_some())
            .times(2)
            .returning(|_| Ok(None));
        store
            .expect_lookup()
            .withf(|r| r.user_id.is_none() && r.route == "/topics")
            .times(1)
            .returning(|_| Ok(Some(record(1, false).with("is_guest", true))));
        let mut provisioner = MockUserProvisioner::new();
        provisioner
            .expect_ensure_user_exists()
            .withf(|identity, board_id| identity == "alice" && *board_id == 1)
            .times(2)
            .returning(|_, _| Ok(true));
        let cache = MockCache::new();

        let mut data = PageData::new();
        assert_ok!(resolver(store, provisioner, cache).resolve(&authenticated(), &mut data).await);

        assert_eq!(data.get_i64("user_id"), Some(1));
        assert!(data.get_bool("is_guest"));
    }

    #[tokio::test]
    async fn exhausts_after_guest_miss() {
        let mut store = MockPageLoadStore::new();
        store
            .expect_lookup()
            .withf(|r| r.user_id.is_some())
            .times(2)
            .returning(|_| Ok(None));
        store
            .expect_lookup()
            .withf(|r| r.user_id.is_none())
            .times(1)
            .returning(|_| Ok(None));
        let mut provisioner = MockUserProvisioner::new();
        provisioner
            .expect_ensure_user_exists()
            .times(2)
            .returning(|_, _| Ok(true));
        let cache = MockCache::new();

        let mut data = PageData::new();
        let err = assert_err!(resolver(store, provisioner, cache).resolve(&authenticated(), &mut data).await);

        assert!(matches!(
            err,
            PageLoadError::ResolutionExhausted { ref session_id, attempts: 3 } if session_id == "sess-1"
        ));
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn provisioning_failure_is_immediate() {
        let mut store = MockPageLoadStore::new();
        store.expect_lookup().times(1).returning(|_| Ok(None));
        let mut provisioner = MockUserProvisioner::new();
        provisioner
            .expect_ensure_user_exists()
            .times(1)
            .returning(|_, _| Ok(false));
        let cache = MockCache::new();

        let mut data = PageData::new();
        let err = assert_err!(resolver(store, provisioner, cache).resolve(&authenticated(), &mut data).await);

        assert!(matches!(
            err,
            PageLoadError::ProvisioningFailure { ref identity, board_id: 1 } if identity == "alice"
        ));
    }

    #[tokio::test]
    async fn active_update_purges_online_users_once() {
        let mut store = MockPageLoadStore::new();
        store
            .expect_lookup()
            .times(1)
            .returning(|_| Ok(Some(record(5, true))));
        let provisioner = MockUserProvisioner::new();
        let mut cache = MockCache::new();
        cache
            .expect_remove()
            .withf(|key| key == USERS_ONLINE_STATUS)
            .times(1)
            .return_const(());

        let mut data = PageData::new();
        assert_ok!(resolver(store, provisioner, cache).resolve(&authenticated(), &mut data).await);
        assert!(data.get_bool(ACTIVE_UPDATE));
    }

    #[tokio::test]
    async fn guest_request_never_provisions() {
        let mut store = MockPageLoadStore::new();
        store
            .expect_lookup()
            .withf(|r| r.user_id.is_none())
            .times(1)
            .returning(|_| Ok(None));
        let mut provisioner = MockUserProvisioner::new();
        provisioner.expect_ensure_user_exists().never();
        let cache = MockCache::new();

        let request = PageLoadRequest::new("sess-2", 1);
        let mut data = PageData::new();
        let err = assert_err!(resolver(store, provisioner, cache).resolve(&request, &mut data).await);

        assert!(matches!(err, PageLoadError::ResolutionExhausted { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn guest_request_resolves_on_first_lookup() {
        let mut store = MockPageLoadStore::new();
        store
            .expect_lookup()
            .times(1)
            .returning(|_| Ok(Some(record(1, false).with("is_guest", true))));
        let mut provisioner = MockUserProvisioner::new();
        provisioner.expect_ensure_user_exists().never();
        let cache = MockCache::new();

        let request = PageLoadRequest::new("sess-3", 1);
        let mut data = PageData::new();
        assert_ok!(resolver(store, provisioner, cache).resolve(&request, &mut data).await);
        assert!(data.get_bool("is_guest"));
    }

    #[tokio::test]
    async fn backend_errors_propagate_without_retry() {
        let mut store = MockPageLoadStore::new();
        store
            .expect_lookup()
            .times(1)
            .returning(|_| Err(DomainError::Unavailable("connection refused".into())));
        let mut provisioner = MockUserProvisioner::new();
        provisioner.expect_ensure_user_exists().never();
        let cache = MockCache::new();

        let mut data = PageData::new();
        let err = assert_err!(resolver(store, provisioner, cache).resolve(&authenticated(), &mut data).await);
        assert!(matches!(err, PageLoadError::Store(DomainError::Unavailable(_))));
    }

    #[tokio::test]
    async fn policy_controls_identity_attempts() {
        let mut store = MockPageLoadStore::new();
        store
            .expect_lookup()
            .withf(|r| r.user_id.is_some())
            .times(3)
            .returning(|_| Ok(None));
        store
            .expect_lookup()
            .withf(|r| r.user_id.is_none())
            .times(1)
            .returning(|_| Ok(Some(record(1, false))));
        let mut provisioner = MockUserProvisioner::new();
        provisioner
            .expect_ensure_user_exists()
            .times(3)
            .returning(|_, _| Ok(true));
        let cache = MockCache::new();

        let resolver = resolver(store, provisioner, cache).with_policy(ResolverPolicy::new(3));
        let mut data = PageData::new();
        assert_ok!(resolver.resolve(&authenticated(), &mut data).await);
    }

    #[test]
    fn policy_never_drops_below_one_attempt() {
        assert_eq!(ResolverPolicy::new(0).identity_attempts, 1);
        assert_eq!(ResolverPolicy::default().identity_attempts, 2);
    }
}
