//! Turns the raw pieces of an HTTP request into a [`PageLoadRequest`].
//!
//! Kept free of any web framework so the mapping can be tested on its own;
//! the axum middleware only extracts headers and hands them over.

use domains::{ContentLocation, PageLoadRequest};
use services::{ClientHints, RouteNormalizer};

/// Request data the page-load lookup depends on, as read off the wire.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest<'a> {
    pub session_id: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    /// Identity asserted by the trusted front end; blank means anonymous.
    pub identity: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub ch_mobile: Option<&'a str>,
    pub forwarded_for: Option<&'a str>,
    pub peer_ip: Option<String>,
    pub dnt: Option<&'a str>,
}

impl IncomingRequest<'_> {
    pub fn into_page_load(self, board_id: i32, normalizer: &RouteNormalizer) -> PageLoadRequest {
        let normalized = normalizer.normalize(self.path, self.query);
        let hints = ClientHints::detect(self.user_agent, self.ch_mobile);

        let mut request = PageLoadRequest::new(self.session_id, board_id);
        request.user_id = self
            .identity
            .map(str::trim)
            .filter(|identity| !identity.is_empty())
            .map(str::to_string);
        request.client_ip = client_ip(self.forwarded_for, self.peer_ip);
        request.location = content_location(self.query);
        request.route = normalized.route;
        request.page_query = normalized.page_query;
        request.browser = hints.browser;
        request.platform = hints.platform;
        request.is_search_engine = hints.is_search_engine;
        request.is_mobile_device = hints.is_mobile_device;
        request.do_not_track = matches!(self.dnt.map(str::trim), Some("1"));
        request
    }
}

/// First hop of `X-Forwarded-For`, else the socket peer.
pub fn client_ip(forwarded_for: Option<&str>, peer_ip: Option<String>) -> String {
    forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
        .or(peer_ip)
        .unwrap_or_default()
}

/// Category, forum, topic and message ids from the `c`, `f`, `t` and `m`
/// query parameters. Anything unparsable is left unset.
pub fn content_location(query: Option<&str>) -> ContentLocation {
    let mut location = ContentLocation::default();
    let Some(query) = query else {
        return location;
    };

    let query = query.strip_prefix('?').unwrap_or(query);
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let slot = match key.as_ref() {
            "c" => &mut location.category_id,
            "f" => &mut location.forum_id,
            "t" => &mut location.topic_id,
            "m" => &mut location.message_id,
            _ => continue,
        };
        if let Ok(id) = value.trim().parse() {
            *slot = Some(id);
        }
    }
    location
}
