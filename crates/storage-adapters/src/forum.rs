//! # In-memory forum store
//!
//! Boards, users and the active-session table, enough to serve page loads,
//! user provisioning, the online list and admin page access without a
//! database.
//!
//! # Developer Note
//! No method holds a `DashMap` guard while touching another map entry of the
//! same map; guards on different maps may overlap.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    ActiveUser, ActiveUserRepo, AdminPageAccessRepo, ContentLocation, ForumPage, PageLoadRecord,
    PageLoadRequest, PageLoadStore, Result, UserProvisioner,
};
use tracing::{debug, info, warn};

/// Sessions idle longer than this drop out of the online list.
pub const DEFAULT_ACTIVE_MINUTES: i64 = 15;

#[derive(Debug, Clone)]
struct BoardRow {
    guest_user_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct UserRow {
    id: i64,
    name: String,
    is_guest: bool,
    is_host_admin: bool,
}

#[derive(Debug, Clone)]
struct SessionRow {
    board_id: i32,
    user_id: i64,
    client_ip: String,
    location: String,
    content: ContentLocation,
    browser: String,
    platform: String,
    is_crawler: bool,
    last_active: DateTime<Utc>,
}

pub struct InMemoryForum {
    boards: DashMap<i32, BoardRow>,
    users: DashMap<i64, UserRow>,
    /// (board, membership identity) -> forum user id
    identities: DashMap<(i32, String), i64>,
    sessions: DashMap<String, SessionRow>,
    admin_access: DashMap<i64, Vec<ForumPage>>,
    next_user_id: AtomicI64,
    active_window: Duration,
}

impl InMemoryForum {
    pub fn new(active_window: Duration) -> Self {
        Self {
            boards: DashMap::new(),
            users: DashMap::new(),
            identities: DashMap::new(),
            sessions: DashMap::new(),
            admin_access: DashMap::new(),
            next_user_id: AtomicI64::new(1),
            active_window,
        }
    }

    /// Registers a board. Without a guest user, anonymous page loads on the
    /// board cannot be resolved.
    pub fn add_board(&self, board_id: i32, guest_name: Option<&str>) {
        let guest_user_id = guest_name.map(|name| {
            let id = self.allocate_user_id();
            self.users.insert(
                id,
                UserRow {
                    id,
                    name: name.to_string(),
                    is_guest: true,
                    is_host_admin: false,
                },
            );
            id
        });
        self.boards.insert(board_id, BoardRow { guest_user_id });
    }

    /// Adds a registered user bound to `identity` and returns its forum id.
    pub fn add_user(&self, board_id: i32, identity: &str, name: &str, is_host_admin: bool) -> i64 {
        let id = self.allocate_user_id();
        self.users.insert(
            id,
            UserRow {
                id,
                name: name.to_string(),
                is_guest: false,
                is_host_admin,
            },
        );
        self.identities.insert((board_id, identity.to_string()), id);
        id
    }

    pub fn user_id_for(&self, board_id: i32, identity: &str) -> Option<i64> {
        self.identities
            .get(&(board_id, identity.to_string()))
            .map(|id| *id)
    }

    pub fn grant_admin_page(&self, user_id: i64, page: ForumPage) {
        let mut pages = self.admin_access.entry(user_id).or_default();
        if !pages.contains(&page) {
            pages.push(page);
        }
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.len()
    }

    fn allocate_user_id(&self) -> i64 {
        self.next_user_id.fetch_add(1, Ordering::Relaxed)
    }

    fn resolve_user(&self, request: &PageLoadRequest) -> Option<UserRow> {
        let guest_user_id = self.boards.get(&request.board_id)?.guest_user_id;

        let user_id = match &request.user_id {
            Some(identity) => *self.identities.get(&(request.board_id, identity.clone()))?,
            None => guest_user_id?,
        };

        self.users.get(&user_id).map(|user| user.value().clone())
    }

    /// Drops idle sessions and reports how many went.
    fn purge_stale(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.active_window;
        let mut purged = 0;
        self.sessions.retain(|_, session| {
            let keep = session.last_active >= cutoff;
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }

    /// Upserts the session's active row. True if the online list changed.
    fn touch_session(&self, request: &PageLoadRequest, user: &UserRow, now: DateTime<Utc>) -> bool {
        match self.sessions.entry(request.session_id.clone()) {
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();
                let changed = session.user_id != user.id || session.board_id != request.board_id;

                session.board_id = request.board_id;
                session.user_id = user.id;
                session.client_ip = request.client_ip.clone();
                session.browser = request.browser.clone();
                session.platform = request.platform.clone();
                session.is_crawler = request.is_search_engine;
                session.last_active = now;
                // resource hits carry no location
                if !request.route.is_empty() {
                    session.location = request.route.clone();
                    session.content = request.location;
                }

                changed
            }
            Entry::Vacant(entry) => {
                entry.insert(SessionRow {
                    board_id: request.board_id,
                    user_id: user.id,
                    client_ip: request.client_ip.clone(),
                    location: request.route.clone(),
                    content: request.location,
                    browser: request.browser.clone(),
                    platform: request.platform.clone(),
                    is_crawler: request.is_search_engine,
                    last_active: now,
                });
                true
            }
        }
    }
}

impl Default for InMemoryForum {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_ACTIVE_MINUTES))
    }
}

#[async_trait]
impl PageLoadStore for InMemoryForum {
    async fn lookup(&self, request: &PageLoadRequest) -> Result<Option<PageLoadRecord>> {
        let Some(user) = self.resolve_user(request) else {
            debug!(
                board_id = request.board_id,
                authenticated = request.is_authenticated(),
                "no forum user for page load"
            );
            return Ok(None);
        };

        let now = Utc::now();
        let mut active_update = self.purge_stale(now) > 0;
        if !request.do_not_track {
            active_update |= self.touch_session(request, &user, now);
        }

        let record = PageLoadRecord::new(active_update)
            .with("board_id", request.board_id)
            .with("user_id", user.id)
            .with("user_name", user.name)
            .with("is_guest", user.is_guest)
            .with("is_host_admin", user.is_host_admin)
            .with("is_crawler", request.is_search_engine)
            .with("is_mobile_device", request.is_mobile_device)
            .with("location", request.route.clone())
            .with("category_id", request.location.category_id)
            .with("forum_id", request.location.forum_id)
            .with("topic_id", request.location.topic_id)
            .with("message_id", request.location.message_id);

        Ok(Some(record))
    }
}

#[async_trait]
impl UserProvisioner for InMemoryForum {
    async fn ensure_user_exists(&self, identity: &str, board_id: i32) -> Result<bool> {
        if identity.trim().is_empty() {
            warn!(board_id, "refusing to provision an empty identity");
            return Ok(false);
        }
        if !self.boards.contains_key(&board_id) {
            warn!(board_id, identity, "cannot provision user on unknown board");
            return Ok(false);
        }

        match self.identities.entry((board_id, identity.to_string())) {
            Entry::Occupied(_) => Ok(true),
            Entry::Vacant(entry) => {
                let id = self.allocate_user_id();
                self.users.insert(
                    id,
                    UserRow {
                        id,
                        name: identity.to_string(),
                        is_guest: false,
                        is_host_admin: false,
                    },
                );
                entry.insert(id);
                info!(board_id, user_id = id, "created forum user");
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl ActiveUserRepo for InMemoryForum {
    async fn list_active(&self, board_id: i32) -> Result<Vec<ActiveUser>> {
        let cutoff = Utc::now() - self.active_window;
        let sessions: Vec<SessionRow> = self
            .sessions
            .iter()
            .filter(|entry| entry.board_id == board_id && entry.last_active >= cutoff)
            .map(|entry| entry.value().clone())
            .collect();

        let mut active: Vec<ActiveUser> = sessions
            .into_iter()
            .filter_map(|session| {
                let user = self.users.get(&session.user_id)?.value().clone();
                Some(ActiveUser {
                    user_id: user.id,
                    user_name: user.name,
                    is_guest: user.is_guest,
                    is_crawler: session.is_crawler,
                    browser: session.browser,
                    location: session.location,
                    last_active: session.last_active,
                })
            })
            .collect();

        active.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        Ok(active)
    }
}

#[async_trait]
impl AdminPageAccessRepo for InMemoryForum {
    async fn list_pages(&self, user_id: i64) -> Result<Vec<ForumPage>> {
        Ok(self
            .admin_access
            .get(&user_id)
            .map(|pages| pages.value().clone())
            .unwrap_or_default())
    }
}
