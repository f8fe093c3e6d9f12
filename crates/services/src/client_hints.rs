//! Browser, platform and crawler detection from request headers.
//!
//! Deliberately coarse: the values only feed the "who's online" list and the
//! page-load record, so a handful of substring tables is enough.

const UNKNOWN: &str = "Unknown";

/// (token in the lower-cased user agent, display name). First match wins.
const CRAWLERS: &[(&str, &str)] = &[
    ("googlebot", "Googlebot"),
    ("bingbot", "Bingbot"),
    ("duckduckbot", "DuckDuckBot"),
    ("yandexbot", "YandexBot"),
    ("baiduspider", "Baiduspider"),
    ("applebot", "Applebot"),
    ("slurp", "Yahoo! Slurp"),
    ("facebookexternalhit", "Facebook"),
    ("ahrefsbot", "AhrefsBot"),
    ("semrushbot", "SemrushBot"),
    ("crawler", "Crawler"),
    ("spider", "Spider"),
    ("bot/", "Bot"),
];

// Order matters: Edge and Opera also announce Chrome, Chrome announces Safari.
const BROWSERS: &[(&str, &str)] = &[
    ("edg/", "Edge"),
    ("opr/", "Opera"),
    ("firefox/", "Firefox"),
    ("chrome/", "Chrome"),
    ("safari/", "Safari"),
    ("trident/", "Internet Explorer"),
    ("msie ", "Internet Explorer"),
];

const PLATFORMS: &[(&str, &str)] = &[
    ("windows", "Windows"),
    ("android", "Android"),
    ("iphone", "iOS"),
    ("ipad", "iOS"),
    ("cros", "ChromeOS"),
    ("mac os x", "macOS"),
    ("linux", "Linux"),
];

const MOBILE_TOKENS: &[&str] = &["mobi", "android", "iphone", "ipad", "ipod"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHints {
    pub browser: String,
    pub platform: String,
    pub is_search_engine: bool,
    pub is_mobile_device: bool,
}

impl ClientHints {
    /// `ch_mobile` is the raw `Sec-CH-UA-Mobile` header value (`?1` / `?0`).
    pub fn detect(user_agent: Option<&str>, ch_mobile: Option<&str>) -> Self {
        let agent = user_agent.unwrap_or_default().to_ascii_lowercase();

        let crawler = lookup(CRAWLERS, &agent);
        let browser = crawler.or_else(|| lookup(BROWSERS, &agent)).unwrap_or(UNKNOWN);
        let platform = lookup(PLATFORMS, &agent).unwrap_or(UNKNOWN);

        let is_mobile_device = match ch_mobile.map(str::trim) {
            Some("?1") => true,
            Some("?0") => false,
            _ => crawler.is_none() && MOBILE_TOKENS.iter().any(|token| agent.contains(token)),
        };

        Self {
            browser: browser.to_string(),
            platform: platform.to_string(),
            is_search_engine: crawler.is_some(),
            is_mobile_device,
        }
    }
}

fn lookup(table: &[(&str, &'static str)], agent: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(token, _)| agent.contains(token))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";
    const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    #[test]
    fn desktop_browser() {
        let hints = ClientHints::detect(Some(CHROME_WINDOWS), None);
        assert_eq!(hints.browser, "Chrome");
        assert_eq!(hints.platform, "Windows");
        assert!(!hints.is_mobile_device);
        assert!(!hints.is_search_engine);
    }

    #[test]
    fn mobile_safari() {
        let hints = ClientHints::detect(Some(SAFARI_IPHONE), None);
        assert_eq!(hints.browser, "Safari");
        assert_eq!(hints.platform, "iOS");
        assert!(hints.is_mobile_device);
    }

    #[test]
    fn crawler_becomes_the_browser() {
        let hints = ClientHints::detect(Some(GOOGLEBOT), None);
        assert_eq!(hints.browser, "Googlebot");
        assert!(hints.is_search_engine);
        assert!(!hints.is_mobile_device);
    }

    #[test]
    fn client_hint_header_wins() {
        assert!(ClientHints::detect(Some(CHROME_WINDOWS), Some("?1")).is_mobile_device);
        assert!(!ClientHints::detect(Some(SAFARI_IPHONE), Some("?0")).is_mobile_device);
    }

    #[test]
    fn missing_agent() {
        let hints = ClientHints::detect(None, None);
        assert_eq!(hints.browser, UNKNOWN);
        assert_eq!(hints.platform, UNKNOWN);
    }
}
