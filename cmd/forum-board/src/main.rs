//! # forum-board
//!
//! Wires the in-memory adapters, the page-load resolver and the axum router
//! together from [`configs::Settings`] and serves until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, PageLoadConfig, PageLoadMetrics};
use configs::{LoggingSettings, Settings};
use services::{BoardDateTime, DateFormats, LinkBuilder, PageLoadResolver, ResolverPolicy, RouteNormalizer};
use storage_adapters::{InMemoryCache, InMemoryForum};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.logging)?;

    let state = build_state(&settings)?;
    let app = router(state);

    let listener = TcpListener::bind(&settings.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.server.bind_addr))?;
    info!(
        addr = %listener.local_addr()?,
        board_id = settings.board.id,
        identity_attempts = settings.page_load.identity_attempts,
        "forum board listening"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("forum board stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .context("parsing log filter")?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    Ok(())
}

fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let board_id = settings.board.id;

    let forum = Arc::new(InMemoryForum::new(chrono::Duration::minutes(
        settings.online.active_minutes,
    )));
    forum.add_board(board_id, settings.board.guest_name.as_deref());
    if let Some(identity) = &settings.board.admin_identity {
        let user_id = forum.add_user(board_id, identity, identity, true);
        info!(board_id, user_id, identity = %identity, "seeded host administrator");
        if !settings.server.is_loopback() {
            warn!(
                bind_addr = %settings.server.bind_addr,
                header = %settings.page_load.user_header,
                "host administrator is reachable by anyone who can set the identity header; \
                 only expose this address behind a front end that overwrites it"
            );
        }
    }

    let cache = Arc::new(InMemoryCache::new());
    let resolver = PageLoadResolver::new(forum.clone(), forum.clone(), cache.clone())
        .with_policy(ResolverPolicy::new(settings.page_load.identity_attempts));

    let dates = &settings.dates;
    let formats = DateFormats {
        date_short: dates.date_short.clone(),
        date_long: dates.date_long.clone(),
        time: dates.time.clone(),
        date_time: dates.date_time.clone(),
        date_time_short: dates.date_time_short.clone(),
    };
    let dates = BoardDateTime::new(dates.utc_offset_minutes, formats).context("date formats")?;

    Ok(AppState {
        resolver: Arc::new(resolver),
        cache,
        active_users: forum.clone(),
        admin_access: forum,
        dates: Arc::new(dates),
        links: Arc::new(LinkBuilder::default()),
        routes: Arc::new(RouteNormalizer::new(settings.page_load.resource_marker.clone())),
        metrics: Arc::new(PageLoadMetrics::new()),
        page_load: Arc::new(PageLoadConfig {
            board_id,
            user_header: settings.page_load.user_header.clone(),
            session_cookie: settings.page_load.session_cookie.clone(),
        }),
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
