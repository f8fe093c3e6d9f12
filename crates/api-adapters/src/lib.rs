//! # api-adapters
//!
//! HTTP boundary of the forum board. The framework-independent parts
//! (request mapping, failure policy, metrics) are always built; the axum
//! router, middleware and handlers need the `web-axum` feature.

pub mod failure;
pub mod metrics;
pub mod request;
pub mod state;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;

pub use failure::{failure_action, FailureAction};
pub use metrics::{Outcome, PageLoadMetrics};
pub use request::IncomingRequest;
pub use state::{AppState, PageLoadConfig};

#[cfg(feature = "web-axum")]
pub use error::ApiError;

/// Builds the application router. Every page route runs through the
/// page-load middleware; `/metrics` does not.
#[cfg(feature = "web-axum")]
pub fn router(state: AppState) -> axum::Router {
    use axum::routing::get;
    use tower_http::trace::TraceLayer;

    let pages = axum::Router::new()
        .route("/", get(handlers::index))
        .route(&failure::info_route(), get(handlers::info))
        .route("/who-is-online", get(handlers::who_is_online))
        .route("/admin/menu", get(handlers::admin_menu))
        .route("/resource/{*path}", get(handlers::resource))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::init_page_load,
        ));

    pages
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
