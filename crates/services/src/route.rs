//! Request path shaping before the page-load lookup.

/// Marker of the internal resource handler; those requests are not tracked
/// as page locations.
pub const DEFAULT_RESOURCE_MARKER: &str = "/resource/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRoute {
    pub route: String,
    pub page_query: String,
}

#[derive(Debug, Clone)]
pub struct RouteNormalizer {
    resource_marker: String,
}

impl RouteNormalizer {
    pub fn new(resource_marker: impl Into<String>) -> Self {
        Self {
            resource_marker: resource_marker.into(),
        }
    }

    /// Route and query as passed to the store. Resource endpoints collapse to
    /// an empty route and query whatever was requested.
    pub fn normalize(&self, path: &str, query: Option<&str>) -> NormalizedRoute {
        if !self.resource_marker.is_empty() && path.contains(&self.resource_marker) {
            return NormalizedRoute {
                route: String::new(),
                page_query: String::new(),
            };
        }

        let page_query = query
            .map(|q| q.strip_prefix('?').unwrap_or(q))
            .unwrap_or_default()
            .to_string();

        NormalizedRoute {
            route: path.to_string(),
            page_query,
        }
    }
}

impl Default for RouteNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCE_MARKER)
    }
}
