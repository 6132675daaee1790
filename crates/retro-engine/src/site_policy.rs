//! Site Policy
//!
//! Decides whether the theme may run on a host.

use url::Url;

/// Site-decision collaborator
pub trait SitePolicy {
    fn is_site_allowed(&self, hostname: &str) -> bool;
}

/// Allow/block lists from the user's preferences.
///
/// The blocklist wins. A non-empty allowlist restricts the theme to its
/// entries. An entry matches its host and every subdomain of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSitePolicy {
    allowlist: Vec<String>,
    blocklist: Vec<String>,
}

impl ListSitePolicy {
    pub fn new(allowlist: &[String], blocklist: &[String]) -> Self {
        Self {
            allowlist: allowlist.iter().filter_map(|e| normalize_entry(e)).collect(),
            blocklist: blocklist.iter().filter_map(|e| normalize_entry(e)).collect(),
        }
    }
}

impl SitePolicy for ListSitePolicy {
    fn is_site_allowed(&self, hostname: &str) -> bool {
        let host = hostname.trim().trim_end_matches('.').to_ascii_lowercase();
        if self.blocklist.iter().any(|entry| host_matches(&host, entry)) {
            return false;
        }
        self.allowlist.is_empty() || self.allowlist.iter().any(|entry| host_matches(&host, entry))
    }
}

/// Any site is allowed
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SitePolicy for AllowAll {
    fn is_site_allowed(&self, _hostname: &str) -> bool {
        true
    }
}

/// Hostname of a document URL; empty for URLs without one (`about:blank`,
/// `file:` paths)
pub fn hostname_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

/// Entries may be bare hosts or full URLs
fn normalize_entry(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    let host = if entry.contains("://") {
        hostname_of(entry)
    } else {
        entry
            .trim_start_matches("*.")
            .trim_end_matches('.')
            .to_ascii_lowercase()
    };
    (!host.is_empty()).then_some(host)
}

fn host_matches(host: &str, entry: &str) -> bool {
    host == entry
        || host
            .strip_suffix(entry)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists(allow: &[&str], block: &[&str]) -> ListSitePolicy {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        ListSitePolicy::new(&owned(allow), &owned(block))
    }

    #[test]
    fn test_empty_lists_allow_everything() {
        assert!(lists(&[], &[]).is_site_allowed("example.com"));
    }

    #[test]
    fn test_blocklist_wins_and_covers_subdomains() {
        let policy = lists(&["example.com"], &["example.com"]);
        assert!(!policy.is_site_allowed("example.com"));
        let policy = lists(&[], &["bank.test"]);
        assert!(!policy.is_site_allowed("www.bank.test"));
        assert!(policy.is_site_allowed("notbank.test"));
    }

    #[test]
    fn test_allowlist_restricts() {
        let policy = lists(&["*.retro.dev", "https://news.example/path"], &[]);
        assert!(policy.is_site_allowed("retro.dev"));
        assert!(policy.is_site_allowed("blog.retro.dev"));
        assert!(policy.is_site_allowed("NEWS.example."));
        assert!(!policy.is_site_allowed("other.dev"));
    }

    #[test]
    fn test_hostname_of() {
        assert_eq!(hostname_of("https://Sub.Example.com:8080/a?b"), "sub.example.com");
        assert_eq!(hostname_of("about:blank"), "");
        assert_eq!(hostname_of("not a url"), "");
    }
}
