//! What to do when page-load resolution fails for a request.

use domains::ForumPage;
use services::LinkBuilder;

/// Reaction to a fatal page-load error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureAction {
    /// Send the visitor to the info page with this location.
    RedirectToInfo(String),
    /// Already on the info page; redirecting again would loop, so fail the request.
    Propagate,
}

/// Info message slug shown after a failed page load.
pub const FAILURE_MESSAGE: &str = "failure";

/// Router-relative mount point of the info page, `/info/{message}`.
pub fn info_route() -> String {
    format!("{}/{{message}}", ForumPage::Info.path())
}

/// Picks the reaction for a failure on `path` (router-relative, as matched
/// against [`info_route`]). The redirect target is the public link from
/// `links`, which may carry a mount prefix.
pub fn failure_action(path: &str, links: &LinkBuilder) -> FailureAction {
    let info_root = ForumPage::Info.path();
    let on_info_page = path == info_root
        || path
            .strip_prefix(info_root.as_str())
            .is_some_and(|rest| rest.starts_with('/'));

    if on_info_page {
        FailureAction::Propagate
    } else {
        FailureAction::RedirectToInfo(links.info(FAILURE_MESSAGE))
    }
}
