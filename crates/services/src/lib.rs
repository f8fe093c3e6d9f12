//! # services
//!
//! Request-independent forum logic built on the `domains` ports: page-load
//! resolution, request shaping helpers, date formatting and the admin menu.

pub mod admin_menu;
pub mod cache;
pub mod client_hints;
pub mod date_time;
pub mod links;
pub mod page_load;
pub mod route;

pub use admin_menu::{AdminMenu, AdminMenuBuilder, MenuEntry, MenuLink, TextKey};
pub use client_hints::ClientHints;
pub use date_time::{BoardDateTime, DateFormats, DateTimeFormat, DateTimeService, DateTimeServiceExt};
pub use links::LinkBuilder;
pub use page_load::{PageLoadError, PageLoadResolver, ResolverPolicy};
pub use route::{NormalizedRoute, RouteNormalizer};
