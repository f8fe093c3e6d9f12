//! Shared fixtures for the end-to-end tests: one board backed by the
//! in-memory adapters, wired the same way the binary wires it.

use std::sync::Arc;

use api_adapters::{AppState, PageLoadConfig, PageLoadMetrics};
use domains::PageLoadRequest;
use services::{BoardDateTime, LinkBuilder, PageLoadResolver, RouteNormalizer};
use storage_adapters::{InMemoryCache, InMemoryForum};

pub const BOARD_ID: i32 = 1;
pub const GUEST_NAME: &str = "Guest";
pub const USER_HEADER: &str = "x-authenticated-user";

pub struct TestBoard {
    pub forum: Arc<InMemoryForum>,
    pub cache: Arc<InMemoryCache>,
    pub metrics: Arc<PageLoadMetrics>,
}

impl TestBoard {
    /// Board [`BOARD_ID`] with a guest user and nobody else.
    pub fn new() -> Self {
        let forum = Arc::new(InMemoryForum::default());
        forum.add_board(BOARD_ID, Some(GUEST_NAME));
        Self {
            forum,
            cache: Arc::new(InMemoryCache::new()),
            metrics: Arc::new(PageLoadMetrics::new()),
        }
    }

    /// Board whose guest user is missing, so anonymous page loads fail.
    pub fn without_guest() -> Self {
        let board = Self::new();
        board.forum.add_board(BOARD_ID, None);
        board
    }

    pub fn resolver(&self) -> PageLoadResolver {
        PageLoadResolver::new(self.forum.clone(), self.forum.clone(), self.cache.clone())
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            resolver: Arc::new(self.resolver()),
            cache: self.cache.clone(),
            active_users: self.forum.clone(),
            admin_access: self.forum.clone(),
            dates: Arc::new(BoardDateTime::default()),
            links: Arc::new(LinkBuilder::default()),
            routes: Arc::new(RouteNormalizer::default()),
            metrics: self.metrics.clone(),
            page_load: Arc::new(PageLoadConfig {
                board_id: BOARD_ID,
                user_header: USER_HEADER.into(),
                ..PageLoadConfig::default()
            }),
        }
    }
}

impl Default for TestBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// A page request for `session_id` on the test board.
pub fn page_request(session_id: &str, route: &str, user_id: Option<&str>) -> PageLoadRequest {
    let mut request = PageLoadRequest::new(session_id, BOARD_ID);
    request.route = route.to_string();
    request.user_id = user_id.map(str::to_string);
    request.browser = "Firefox".into();
    request.platform = "Linux".into();
    request
}
