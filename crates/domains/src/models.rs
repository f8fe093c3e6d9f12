//! # Domain Models
//!
//! These structs describe a single page request as the forum sees it and the
//! tracking record the page-load store hands back for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the boolean field every [`PageLoadRecord`] carries.
pub const ACTIVE_UPDATE: &str = "active_update";

/// Content coordinates of the page being viewed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLocation {
    pub category_id: Option<i32>,
    pub forum_id: Option<i32>,
    pub topic_id: Option<i32>,
    pub message_id: Option<i32>,
}

/// Everything the page-load store needs to know about one inbound request.
///
/// Built once at the HTTP boundary and never mutated afterwards; retries
/// under a different identity go through [`PageLoadRequest::as_identity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLoadRequest {
    pub session_id: String,
    pub board_id: i32,
    /// Membership identity, present only for authenticated callers
    pub user_id: Option<String>,
    pub client_ip: String,
    /// Normalized request path; empty for resource endpoints
    pub route: String,
    /// Normalized query string without the leading `?`; empty for resource endpoints
    pub page_query: String,
    pub browser: String,
    pub platform: String,
    pub location: ContentLocation,
    pub is_search_engine: bool,
    pub is_mobile_device: bool,
    pub do_not_track: bool,
}

impl PageLoadRequest {
    /// A guest request for `session_id` on `board_id` with every hint left blank.
    pub fn new(session_id: impl Into<String>, board_id: i32) -> Self {
        Self {
            session_id: session_id.into(),
            board_id,
            user_id: None,
            client_ip: String::new(),
            route: String::new(),
            page_query: String::new(),
            browser: String::new(),
            platform: String::new(),
            location: ContentLocation::default(),
            is_search_engine: false,
            is_mobile_device: false,
            do_not_track: false,
        }
    }

    /// Same request, looked up as `user_id` instead (`None` means guest).
    pub fn as_identity(&self, user_id: Option<String>) -> Self {
        Self {
            user_id,
            ..self.clone()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// The store's answer to a page-load lookup.
///
/// A bag of named fields, always containing [`ACTIVE_UPDATE`]. Produced fresh
/// per lookup and merged straight into the caller's [`PageData`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageLoadRecord {
    fields: Map<String, Value>,
}

impl PageLoadRecord {
    pub fn new(active_update: bool) -> Self {
        let mut fields = Map::new();
        fields.insert(ACTIVE_UPDATE.to_string(), Value::Bool(active_update));
        Self { fields }
    }

    /// Adds a field. Setting [`ACTIVE_UPDATE`] to a non-boolean is ignored.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == ACTIVE_UPDATE && !value.is_boolean() {
            return self;
        }
        self.fields.insert(key, value);
        self
    }

    pub fn active_update(&self) -> bool {
        self.fields
            .get(ACTIVE_UPDATE)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

/// Per-request data dictionary owned by the caller of the resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageData(Map<String, Value>);

impl PageData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every field of `record` in, overwriting existing keys.
    pub fn merge(&mut self, record: PageLoadRecord) {
        self.0.extend(record.into_fields());
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Missing or non-boolean values read as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One row of the "who's online" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub user_id: i64,
    pub user_name: String,
    pub is_guest: bool,
    pub is_crawler: bool,
    pub browser: String,
    /// Route the session last requested
    pub location: String,
    pub last_active: DateTime<Utc>,
}

macro_rules! forum_pages {
    ($($variant:ident => $name:literal, admin: $admin:literal;)*) => {
        /// Pages the forum knows about. Admin pages are gated by per-user
        /// page access unless the user is a host admin.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ForumPage {
            $(
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl ForumPage {
            pub const ALL: &'static [ForumPage] = &[$(ForumPage::$variant),*];

            /// Stable snake_case name, as stored in page access lists.
            pub fn name(self) -> &'static str {
                match self {
                    $(ForumPage::$variant => $name,)*
                }
            }

            pub fn is_admin_page(self) -> bool {
                match self {
                    $(ForumPage::$variant => $admin,)*
                }
            }
        }
    };
}

forum_pages! {
    Board => "board", admin: false;
    Topics => "topics", admin: false;
    Posts => "posts", admin: false;
    Profile => "profile", admin: false;
    Info => "info", admin: false;
    AdminAdmin => "admin_admin", admin: true;
    AdminHostSettings => "admin_host_settings", admin: true;
    AdminBoards => "admin_boards", admin: true;
    AdminEditBoard => "admin_edit_board", admin: true;
    AdminPageAccessEdit => "admin_page_access_edit", admin: true;
    AdminPageAccessList => "admin_page_access_list", admin: true;
    AdminBoardAnnouncement => "admin_board_announcement", admin: true;
    AdminSettings => "admin_settings", admin: true;
    AdminForums => "admin_forums", admin: true;
    AdminEditForum => "admin_edit_forum", admin: true;
    AdminEditCategory => "admin_edit_category", admin: true;
    AdminReplaceWords => "admin_replace_words", admin: true;
    AdminBbCodes => "admin_bb_codes", admin: true;
    AdminBbCodeEdit => "admin_bb_code_edit", admin: true;
    AdminLanguages => "admin_languages", admin: true;
    AdminEditLanguage => "admin_edit_language", admin: true;
    AdminSpamLog => "admin_spam_log", admin: true;
    AdminSpamWords => "admin_spam_words", admin: true;
    AdminBannedEmails => "admin_banned_emails", admin: true;
    AdminBannedIps => "admin_banned_ips", admin: true;
    AdminBannedNames => "admin_banned_names", admin: true;
    AdminProfileDefinitions => "admin_profile_definitions", admin: true;
    AdminAccessMasks => "admin_access_masks", admin: true;
    AdminEditAccessMask => "admin_edit_access_mask", admin: true;
    AdminGroups => "admin_groups", admin: true;
    AdminEditGroup => "admin_edit_group", admin: true;
    AdminRanks => "admin_ranks", admin: true;
    AdminEditRank => "admin_edit_rank", admin: true;
    AdminUsers => "admin_users", admin: true;
    AdminEditUser => "admin_edit_user", admin: true;
    AdminMedals => "admin_medals", admin: true;
    AdminEditMedal => "admin_edit_medal", admin: true;
    AdminMail => "admin_mail", admin: true;
    AdminDigest => "admin_digest", admin: true;
    AdminPrune => "admin_prune", admin: true;
    AdminRestore => "admin_restore", admin: true;
    AdminPm => "admin_pm", admin: true;
    AdminTaskManager => "admin_task_manager", admin: true;
    AdminEventLog => "admin_event_log", admin: true;
    AdminRestartApp => "admin_restart_app", admin: true;
    AdminReIndex => "admin_re_index", admin: true;
    AdminRunSql => "admin_run_sql", admin: true;
    AdminNntpRetrieve => "admin_nntp_retrieve", admin: true;
    AdminNntpForums => "admin_nntp_forums", admin: true;
    AdminNntpServers => "admin_nntp_servers", admin: true;
    AdminVersion => "admin_version", admin: true;
}

impl ForumPage {
    /// Site-relative path of the page, e.g. `/admin/forums`.
    pub fn path(self) -> String {
        match self {
            ForumPage::Board => "/".to_string(),
            ForumPage::AdminAdmin => "/admin".to_string(),
            page => match page.name().strip_prefix("admin_") {
                Some(rest) => format!("/admin/{}", rest.replace('_', "-")),
                None => format!("/{}", page.name()),
            },
        }
    }
}
