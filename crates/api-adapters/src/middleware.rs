//! # Page-load middleware
//!
//! Runs ahead of every page handler: identifies the session, resolves the
//! page load and leaves the resulting [`PageData`] in the request extensions.
//! A failed resolution is logged here and turned into a redirect to the info
//! page, except on the info page itself, where it becomes a 500.
//!
//! The identity header is taken as-is: the server must only be reachable
//! through the front end that sets (and strips) it.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use domains::{PageData, ACTIVE_UPDATE};
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::failure::{failure_action, FailureAction};
use crate::metrics::Outcome;
use crate::request::IncomingRequest;
use crate::state::AppState;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const SEC_CH_UA_MOBILE: &str = "sec-ch-ua-mobile";
pub const DNT: &str = "dnt";

pub async fn init_page_load(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let config = &state.page_load;
    let existing_session = session_cookie(request.headers(), &config.session_cookie);
    let issued_session = existing_session.is_none();
    let session_id = existing_session.unwrap_or_else(|| Uuid::new_v4().to_string());

    let page_load = {
        let headers = request.headers();
        let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
        let peer_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        IncomingRequest {
            session_id: &session_id,
            path: request.uri().path(),
            query: request.uri().query(),
            identity: header(&config.user_header),
            user_agent: header(USER_AGENT.as_str()),
            ch_mobile: header(SEC_CH_UA_MOBILE),
            forwarded_for: header(X_FORWARDED_FOR),
            peer_ip,
            dnt: header(DNT),
        }
        .into_page_load(config.board_id, &state.routes)
    };

    let mut data = PageData::new();
    let result = state.resolver.resolve(&page_load, &mut data).await;
    state.metrics.record(Outcome::of(&result));

    let mut response = match result {
        Ok(()) => {
            if data.get_bool(ACTIVE_UPDATE) {
                state.metrics.record_active_update();
            }
            request.extensions_mut().insert(data);
            next.run(request).await
        }
        Err(err) => {
            error!(url = %request.uri(), error = %err, "page load failed");
            match failure_action(request.uri().path(), &state.links) {
                FailureAction::RedirectToInfo(location) => Redirect::to(&location).into_response(),
                FailureAction::Propagate => return Err(err.into()),
            }
        }
    };

    if issued_session {
        set_session_cookie(&mut response, &config.session_cookie, &session_id);
    }
    Ok(response)
}

/// Value of the `name` cookie, if the client sent a non-empty one. A value
/// in double quotes is unquoted.
pub fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(value);
            (key.trim(), value)
        })
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn set_session_cookie(response: &mut Response, name: &str, session_id: &str) {
    let cookie = format!("{name}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(err) => warn!(error = %err, "session cookie not representable as a header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; forum_session=abc"));
        assert_eq!(session_cookie(&headers, "forum_session").as_deref(), Some("abc"));
        assert_eq!(session_cookie(&headers, "other"), None);
    }

    #[test]
    fn quoted_session_cookie_is_unquoted() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("forum_session=\"abc\"; theme=dark"));
        assert_eq!(session_cookie(&headers, "forum_session").as_deref(), Some("abc"));

        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("forum_session=\"\""));
        assert_eq!(session_cookie(&headers, "forum_session"), None);
    }

    #[test]
    fn empty_session_cookie_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("forum_session="));
        assert_eq!(session_cookie(&headers, "forum_session"), None);
    }
}
