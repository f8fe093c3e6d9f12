use axum::body::{to_bytes, Body};
use axum::http::header::COOKIE;
use axum::http::{Request, StatusCode};
use api_adapters::router;
use domains::ForumPage;
use integration_tests::{TestBoard, BOARD_ID, USER_HEADER};
use serde_json::Value;
use services::cache::admin_page_access;
use tower::ServiceExt;

fn menu_request(identity: Option<&str>, current: &str) -> Request<Body> {
    let mut builder = Request::get(format!("/admin/menu?current={current}"))
        .header(COOKIE, "forum_session=admin-tests");
    if let Some(identity) = identity {
        builder = builder.header(USER_HEADER, identity);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn dropdown<'a>(menu: &'a Value, tag: &str) -> Option<&'a Value> {
    menu["entries"]
        .as_array()?
        .iter()
        .find(|entry| entry["kind"] == "dropdown" && entry["label"]["tag"] == tag)
}

#[tokio::test]
async fn guests_are_forbidden() {
    let board = TestBoard::new();
    let response = router(board.app_state())
        .oneshot(menu_request(None, "admin_admin"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn members_without_admin_pages_are_forbidden() {
    let board = TestBoard::new();
    board.forum.add_user(BOARD_ID, "member", "member", false);

    let response = router(board.app_state())
        .oneshot(menu_request(Some("member"), "admin_admin"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn host_admin_sees_every_group() {
    let board = TestBoard::new();
    board.forum.add_user(BOARD_ID, "root", "root", true);

    let response = router(board.app_state())
        .oneshot(menu_request(Some("root"), "admin_forums"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let menu = json_body(response).await;
    assert_eq!(menu["active"], true);
    for tag in ["SETTINGS", "Spam_Protection", "UsersandRoles", "Maintenance", "Database", "NNTP", "Upgrade"] {
        assert!(dropdown(&menu, tag).is_some(), "missing group {tag}");
    }

    let settings = dropdown(&menu, "SETTINGS").unwrap();
    let active: Vec<_> = settings["children"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|link| link["active"] == true)
        .map(|link| link["url"].as_str().unwrap())
        .collect();
    assert_eq!(active, vec!["/admin/forums"]);
}

#[tokio::test]
async fn delegated_admin_sees_only_granted_groups() {
    let board = TestBoard::new();
    let user_id = board.forum.add_user(BOARD_ID, "mod", "mod", false);
    board.forum.grant_admin_page(user_id, ForumPage::AdminBannedIps);

    let response = router(board.app_state())
        .oneshot(menu_request(Some("mod"), "admin_banned_ips"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let menu = json_body(response).await;
    assert!(dropdown(&menu, "Spam_Protection").is_some());
    assert!(dropdown(&menu, "SETTINGS").is_none());
    assert!(dropdown(&menu, "Upgrade").is_none());
    assert!(board.cache.contains(&admin_page_access(user_id)));
}
