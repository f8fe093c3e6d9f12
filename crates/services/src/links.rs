use domains::ForumPage;

/// Builds site URLs for forum pages under an optional mount prefix.
#[derive(Debug, Clone, Default)]
pub struct LinkBuilder {
    base_path: String,
}

impl LinkBuilder {
    /// `base_path` is the mount point, e.g. `/forum`. Trailing slashes are dropped.
    pub fn new(base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    pub fn page(&self, page: ForumPage) -> String {
        format!("{}{}", self.base_path, page.path())
    }

    /// Link to the info page showing `message`.
    pub fn info(&self, message: &str) -> String {
        format!("{}{}/{}", self.base_path, ForumPage::Info.path(), message)
    }

    /// The installer/upgrade wizard.
    pub fn installer(&self) -> String {
        format!("{}/install", self.base_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_pages() {
        let links = LinkBuilder::new("/forum/");
        assert_eq!(links.page(ForumPage::AdminForums), "/forum/admin/forums");
        assert_eq!(links.info("failure"), "/forum/info/failure");
        assert_eq!(links.installer(), "/forum/install");
        assert_eq!(LinkBuilder::default().page(ForumPage::Board), "/");
    }
}
