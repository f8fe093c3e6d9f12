use std::sync::Arc;

use domains::{ActiveUserRepo, AdminPageAccessRepo, Cache};
use services::{BoardDateTime, LinkBuilder, PageLoadResolver, RouteNormalizer};

use crate::metrics::PageLoadMetrics;

/// Request-shaping knobs of the page-load middleware.
#[derive(Debug, Clone)]
pub struct PageLoadConfig {
    pub board_id: i32,
    /// Header carrying the authenticated identity, set by the trusted front end.
    pub user_header: String,
    pub session_cookie: String,
}

impl Default for PageLoadConfig {
    fn default() -> Self {
        Self {
            board_id: 1,
            user_header: "x-authenticated-user".into(),
            session_cookie: "forum_session".into(),
        }
    }
}

/// Shared by every handler; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<PageLoadResolver>,
    pub cache: Arc<dyn Cache>,
    pub active_users: Arc<dyn ActiveUserRepo>,
    pub admin_access: Arc<dyn AdminPageAccessRepo>,
    pub dates: Arc<BoardDateTime>,
    pub links: Arc<LinkBuilder>,
    pub routes: Arc<RouteNormalizer>,
    pub metrics: Arc<PageLoadMetrics>,
    pub page_load: Arc<PageLoadConfig>,
}
