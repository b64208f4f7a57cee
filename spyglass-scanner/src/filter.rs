// Vulnerability-class bucketing of discovered links by query parameter names

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static XSS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[?&][a-z0-9_\-]*=").expect("hardcoded regex pattern is valid")
});
static SQLI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[?&](id|user|uid|page)=").expect("hardcoded regex pattern is valid")
});
static LFI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[?&](file|path|dir)=").expect("hardcoded regex pattern is valid")
});
static SSRF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[?&](url|uri|next)=").expect("hardcoded regex pattern is valid")
});
static REDIRECT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[?&](redirect|url)=https?://").expect("hardcoded regex pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Xss,
    Sqli,
    Lfi,
    Ssrf,
    Redirect,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Xss,
        Category::Sqli,
        Category::Lfi,
        Category::Ssrf,
        Category::Redirect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Xss => "xss",
            Category::Sqli => "sqli",
            Category::Lfi => "lfi",
            Category::Ssrf => "ssrf",
            Category::Redirect => "redirect",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Category::Xss => &XSS_PATTERN,
            Category::Sqli => &SQLI_PATTERN,
            Category::Lfi => &LFI_PATTERN,
            Category::Ssrf => &SSRF_PATTERN,
            Category::Redirect => &REDIRECT_PATTERN,
        }
    }

    pub fn matches(&self, link: &str) -> bool {
        self.pattern().is_match(link)
    }
}

/// Links bucketed by category. Every bucket is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredLinks {
    pub xss: Vec<String>,
    pub sqli: Vec<String>,
    pub lfi: Vec<String>,
    pub ssrf: Vec<String>,
    pub redirect: Vec<String>,
}

impl FilteredLinks {
    pub fn bucket(&self, category: Category) -> &[String] {
        match category {
            Category::Xss => &self.xss,
            Category::Sqli => &self.sqli,
            Category::Lfi => &self.lfi,
            Category::Ssrf => &self.ssrf,
            Category::Redirect => &self.redirect,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Xss => &mut self.xss,
            Category::Sqli => &mut self.sqli,
            Category::Lfi => &mut self.lfi,
            Category::Ssrf => &mut self.ssrf,
            Category::Redirect => &mut self.redirect,
        }
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }
}

/// Sort each link into every category it matches.
pub fn apply_filters(links: &[String]) -> FilteredLinks {
    let mut filtered = FilteredLinks::default();
    for link in links {
        for category in Category::ALL {
            if category.matches(link) {
                filtered.bucket_mut(category).push(link.clone());
            }
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_in_multiple_categories() {
        let links = vec!["https://example.com/go?url=https://evil.net".to_string()];
        let filtered = apply_filters(&links);

        assert_eq!(filtered.xss.len(), 1);
        assert_eq!(filtered.ssrf.len(), 1);
        assert_eq!(filtered.redirect.len(), 1);
        assert!(filtered.sqli.is_empty());
        assert!(filtered.lfi.is_empty());
    }

    #[test]
    fn test_link_in_no_category() {
        let links = vec!["https://example.com/about".to_string()];
        let filtered = apply_filters(&links);
        assert_eq!(filtered.total(), 0);
    }

    #[test]
    fn test_parameter_names_are_case_insensitive() {
        assert!(Category::Sqli.matches("https://example.com/item?ID=4"));
        assert!(Category::Lfi.matches("https://example.com/view?a=1&File=x"));
        assert!(!Category::Lfi.matches("https://example.com/view?profile=x"));
    }

    #[test]
    fn test_redirect_needs_absolute_target() {
        assert!(!Category::Redirect.matches("https://example.com/?redirect=/home"));
        assert!(Category::Redirect.matches("https://example.com/?redirect=HTTP://x"));
    }

    #[test]
    fn test_all_buckets_serialized() {
        let json = serde_json::to_value(FilteredLinks::default()).unwrap();
        for category in Category::ALL {
            assert!(json.get(category.as_str()).is_some());
        }
    }
}
