// Extraction pipeline: pure functions from a fetched document to page facts

use crate::domain::is_related_subdomain;
use crate::result::{FormRecord, HeaderSummary};
use regex::Regex;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("hardcoded selector is valid"));
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[src]").expect("hardcoded selector is valid"));
static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form").expect("hardcoded selector is valid"));
static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("hardcoded selector is valid"));

static ENDPOINT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[a-zA-Z0-9_/\-]+").expect("hardcoded regex pattern is valid"));

/// Signature table for technology fingerprinting, reported in this order.
static TECH_SIGNATURES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("PHP", r"\.php"),
        ("ASP.NET", r"\.aspx"),
        ("Java", r"\.jsp"),
        ("WordPress", r"wp-content|wp-includes"),
        ("jQuery", r"jquery"),
        ("React", r"(?i)react"),
        ("Angular", r"(?i)angular"),
        ("Vue", r"(?i)vue"),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        (
            name,
            Regex::new(pattern).expect("hardcoded regex pattern is valid"),
        )
    })
    .collect()
});

/// Structural elements pulled out of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageElements {
    pub links: Vec<String>,
    pub js_files: Vec<String>,
    pub forms: Vec<FormRecord>,
}

/// Resolve an `href`/`src` against `base`. Pseudo-schemes, fragment-only
/// references, unparseable input and non-HTTP results yield `None`.
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    let lowered = reference.to_ascii_lowercase();
    if reference.is_empty()
        || reference.starts_with('#')
        || ["javascript:", "mailto:", "tel:", "data:"]
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut resolved = base.join(reference).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") || resolved.host_str().is_none() {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

/// The base that references resolve against: a `<base href>` when the
/// document declares one, otherwise the final URL of the response.
pub fn effective_base(document: &Html, final_url: &Url) -> Url {
    document
        .select(&BASE_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| final_url.join(href.trim()).ok())
        .unwrap_or_else(|| final_url.clone())
}

/// Links, script sources and forms, each resolved to absolute form.
/// Duplicate links and scripts are collapsed, keeping first-seen order.
pub fn extract_elements(html: &str, final_url: &Url) -> PageElements {
    let document = Html::parse_document(html);
    let base = effective_base(&document, final_url);

    let links = collect_unique(
        document
            .select(&LINK_SELECTOR)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_reference(&base, href)),
    );

    let js_files = collect_unique(
        document
            .select(&SCRIPT_SELECTOR)
            .filter_map(|element| element.value().attr("src"))
            .filter_map(|src| resolve_reference(&base, src)),
    );

    let forms = document
        .select(&FORM_SELECTOR)
        .filter_map(|element| {
            let action = match element.value().attr("action") {
                Some(action) if !action.trim().is_empty() => resolve_reference(&base, action)?,
                _ => base.clone(),
            };
            let method = element
                .value()
                .attr("method")
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or("GET")
                .to_uppercase();
            Some(FormRecord {
                action: action.to_string(),
                method,
            })
        })
        .collect();

    PageElements {
        links,
        js_files,
        forms,
    }
}

fn collect_unique(urls: impl Iterator<Item = Url>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.map(|u| u.to_string())
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

/// Hosts among `links` and `scripts` that differ from the page host but share
/// its registrable domain. Sorted and distinct.
pub fn detect_subdomains(page_url: &Url, links: &[String], scripts: &[String]) -> Vec<String> {
    let Some(page_host) = page_url.host_str() else {
        return Vec::new();
    };

    links
        .iter()
        .chain(scripts)
        .filter_map(|u| Url::parse(u).ok())
        .filter_map(|u| u.host_str().map(str::to_string))
        .filter(|host| is_related_subdomain(host, page_host))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn detect_technologies(html: &str) -> Vec<String> {
    TECH_SIGNATURES
        .iter()
        .filter(|(_, pattern)| pattern.is_match(html))
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn summarize_headers(headers: Option<&HeaderMap>) -> HeaderSummary {
    let Some(headers) = headers else {
        return HeaderSummary::default();
    };
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    HeaderSummary {
        csp: value("content-security-policy"),
        x_frame: value("x-frame-options"),
        x_content_type: value("x-content-type-options"),
    }
}

/// Name of each `&`-separated query segment: the text before the first `=`,
/// or the whole segment when it has none. Empty names are skipped.
pub fn parse_query_names(query: &str) -> impl Iterator<Item = &str> {
    query
        .split('&')
        .map(|segment| segment.split_once('=').map_or(segment, |(name, _)| name))
        .filter(|name| !name.is_empty())
}

/// Distinct parameter names across every link, sorted.
pub fn extract_parameters(links: &[String]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for link in links {
        let Ok(url) = Url::parse(link) else {
            continue;
        };
        if let Some(query) = url.query() {
            names.extend(parse_query_names(query).map(str::to_string));
        }
    }
    names.into_iter().collect()
}

/// Root-relative path fragments found in script text. A heuristic: any
/// slash-delimited run matches.
pub fn parse_js_endpoints(js: &str) -> Vec<String> {
    ENDPOINT_REGEX
        .find_iter(js)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn base() -> Url {
        Url::parse("https://example.com/dir/page.html").unwrap()
    }

    #[test]
    fn test_resolve_reference_forms() {
        let base = base();
        assert_eq!(
            resolve_reference(&base, "other.html").unwrap().as_str(),
            "https://example.com/dir/other.html"
        );
        assert_eq!(
            resolve_reference(&base, "/root").unwrap().as_str(),
            "https://example.com/root"
        );
        assert_eq!(
            resolve_reference(&base, "//cdn.example.com/lib.js").unwrap().as_str(),
            "https://cdn.example.com/lib.js"
        );
        assert_eq!(
            resolve_reference(&base, "http://other.org/x#frag").unwrap().as_str(),
            "http://other.org/x"
        );
    }

    #[test]
    fn test_resolve_reference_drops_pseudo_and_malformed() {
        let base = base();
        assert!(resolve_reference(&base, "javascript:void(0)").is_none());
        assert!(resolve_reference(&base, "MAILTO:a@b.c").is_none());
        assert!(resolve_reference(&base, "tel:123").is_none());
        assert!(resolve_reference(&base, "#top").is_none());
        assert!(resolve_reference(&base, "").is_none());
        assert!(resolve_reference(&base, "http://[::1").is_none());
        assert!(resolve_reference(&base, "ftp://example.com/file").is_none());
    }

    #[test]
    fn test_extract_elements() {
        let html = r#"<html><head>
            <script src="/static/app.js"></script>
            <script>inline()</script>
            </head><body>
            <a href="/a">A</a>
            <a href="/a#again">A again</a>
            <a href="b?x=1">B</a>
            <a href="javascript:alert(1)">bad</a>
            <a>no href</a>
        </body></html>"#;

        let elements = extract_elements(html, &base());
        assert_eq!(
            elements.links,
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/dir/b?x=1".to_string()
            ]
        );
        assert_eq!(elements.js_files, vec!["https://example.com/static/app.js"]);
    }

    #[test]
    fn test_form_method_and_action() {
        let html = r#"<form action="/login" method="post"></form>
                      <form></form>
                      <form action="search" method=" get "></form>"#;
        let base = Url::parse("https://example.com/").unwrap();

        let elements = extract_elements(html, &base);
        assert_eq!(
            elements.forms,
            vec![
                FormRecord {
                    action: "https://example.com/login".to_string(),
                    method: "POST".to_string()
                },
                FormRecord {
                    action: "https://example.com/".to_string(),
                    method: "GET".to_string()
                },
                FormRecord {
                    action: "https://example.com/search".to_string(),
                    method: "GET".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_base_href_overrides_final_url() {
        let html = r#"<head><base href="https://example.com/app/"></head>
                      <a href="settings">s</a>"#;
        let elements = extract_elements(html, &base());
        assert_eq!(elements.links, vec!["https://example.com/app/settings"]);
    }

    #[test]
    fn test_detect_subdomains() {
        let page = Url::parse("https://example.com/").unwrap();
        let links = vec![
            "https://api.example.com/x".to_string(),
            "https://example.com.evil.net/".to_string(),
            "https://evilexample.com/".to_string(),
            "https://example.com/same".to_string(),
        ];
        let scripts = vec![
            "https://cdn.example.com/app.js".to_string(),
            "https://api.example.com/other.js".to_string(),
        ];

        assert_eq!(
            detect_subdomains(&page, &links, &scripts),
            vec!["api.example.com".to_string(), "cdn.example.com".to_string()]
        );
    }

    #[test]
    fn test_detect_technologies() {
        let html = r#"<script src="/wp-content/jquery.min.js"></script>
                      <a href="index.php">home</a><div id="React-root"></div>"#;
        assert_eq!(
            detect_technologies(html),
            vec!["PHP", "WordPress", "jQuery", "React"]
        );
        assert!(detect_technologies("<html>plain</html>").is_empty());
    }

    #[test]
    fn test_technology_case_sensitivity() {
        // jQuery is matched case-sensitively, the front-end frameworks are not
        assert!(detect_technologies("JQUERY").is_empty());
        assert_eq!(detect_technologies("VUE"), vec!["Vue"]);
    }

    #[test]
    fn test_summarize_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static("default-src 'self'"),
        );
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));

        let summary = summarize_headers(Some(&headers));
        assert_eq!(summary.csp, "default-src 'self'");
        assert_eq!(summary.x_frame, "DENY");
        assert_eq!(summary.x_content_type, "");

        assert_eq!(summarize_headers(None), HeaderSummary::default());
    }

    #[test]
    fn test_parse_query_names_edge_cases() {
        let names: Vec<_> = parse_query_names("a=1&flag&=orphan&&b=x=y").collect();
        assert_eq!(names, vec!["a", "flag", "b"]);
    }

    #[test]
    fn test_extract_parameters_is_order_independent() {
        let links = vec![
            "https://example.com/?id=1&page=2".to_string(),
            "https://example.com/search?q=x&id=3".to_string(),
            "https://example.com/plain".to_string(),
        ];
        let mut reversed = links.clone();
        reversed.reverse();

        let expected = vec!["id".to_string(), "page".to_string(), "q".to_string()];
        assert_eq!(extract_parameters(&links), expected);
        assert_eq!(extract_parameters(&reversed), expected);
    }

    #[test]
    fn test_parse_js_endpoints() {
        let js = r#"fetch("/api/v1/users"); const x = a / b; axios.get('/auth/login-now')"#;
        let endpoints = parse_js_endpoints(js);
        assert!(endpoints.contains(&"/api/v1/users".to_string()));
        assert!(endpoints.contains(&"/auth/login-now".to_string()));
        assert!(parse_js_endpoints("no paths here").is_empty());
    }
}
