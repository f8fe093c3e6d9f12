//! # Page handlers
//!
//! Every handler here runs behind [`crate::middleware::init_page_load`] and
//! reads the viewer from the [`PageData`] it left in the request.

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use domains::{ActiveUser, ForumPage, PageData};
use serde::{Deserialize, Serialize};
use services::cache::{admin_page_access, get_or_set, USERS_ONLINE_STATUS};
use services::{admin_menu, AdminMenu, AdminMenuBuilder, DateTimeService};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page: ForumPage,
    pub data: PageData,
}

/// Board index: echoes the resolved page data.
pub async fn index(Extension(data): Extension<PageData>) -> Json<PageResponse> {
    Json(PageResponse {
        page: ForumPage::Board,
        data,
    })
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub message: String,
    pub user_name: Option<String>,
}

pub async fn info(
    Path(message): Path<String>,
    Extension(data): Extension<PageData>,
) -> Json<InfoResponse> {
    Json(InfoResponse {
        message,
        user_name: data.get_str("user_name").map(str::to_string),
    })
}

#[derive(Debug, Serialize)]
pub struct OnlineUser {
    pub user_name: String,
    pub is_guest: bool,
    pub is_crawler: bool,
    pub browser: String,
    pub location: String,
    pub last_active: String,
}

/// Active users of the board, served from the users-online snapshot.
pub async fn who_is_online(State(state): State<AppState>) -> Result<Json<Vec<OnlineUser>>, ApiError> {
    let board_id = state.page_load.board_id;
    let active: Vec<ActiveUser> = get_or_set(state.cache.as_ref(), USERS_ONLINE_STATUS, || {
        state.active_users.list_active(board_id)
    })
    .await?;

    let online = active
        .into_iter()
        .map(|user| OnlineUser {
            last_active: state.dates.format_date_time_topic(user.last_active),
            user_name: user.user_name,
            is_guest: user.is_guest,
            is_crawler: user.is_crawler,
            browser: user.browser,
            location: user.location,
        })
        .collect();

    Ok(Json(online))
}

#[derive(Debug, Deserialize)]
pub struct AdminMenuQuery {
    pub current: Option<ForumPage>,
}

pub async fn admin_menu(
    State(state): State<AppState>,
    Query(query): Query<AdminMenuQuery>,
    Extension(data): Extension<PageData>,
) -> Result<Json<AdminMenu>, ApiError> {
    if data.get_bool("is_guest") {
        return Err(ApiError::Forbidden);
    }
    let user_id = data.get_i64("user_id").ok_or(ApiError::MissingPageData)?;
    let is_host_admin = data.get_bool("is_host_admin");

    let access: Vec<ForumPage> = if is_host_admin {
        Vec::new()
    } else {
        get_or_set(state.cache.as_ref(), &admin_page_access(user_id), || {
            state.admin_access.list_pages(user_id)
        })
        .await?
    };

    if !admin_menu::has_admin_access(is_host_admin, &access) {
        return Err(ApiError::Forbidden);
    }

    let current = query.current.unwrap_or(ForumPage::AdminAdmin);
    let menu = AdminMenuBuilder::new(&state.links).build(current, is_host_admin, &access);
    Ok(Json(menu))
}

/// Stand-in for the resource handler (avatars, attachments). Its page loads
/// are tracked without a location.
pub async fn resource(Path(_path): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.encode()?;
    Ok((
        [(
            CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    ))
}
