// URL identity and host classification helpers

use url::Url;

/// Canonical identity of a URL: the serialized form with the fragment removed.
///
/// `Url` already lower-cases scheme and host, drops default ports and
/// normalizes an empty path to `/`, so two references that differ only in
/// those details or in their fragment share an identity.
pub fn url_identity(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Returns the registrable (eTLD+1) domain of a host, e.g. `example.co.uk`
/// for `api.example.co.uk`. IP addresses and bare public suffixes have none.
pub fn registrable_domain(host: &str) -> Option<String> {
    let host = host.trim_end_matches('.').to_lowercase();
    if host.parse::<std::net::IpAddr>().is_ok() {
        return None;
    }
    psl::domain_str(&host).map(str::to_string)
}

/// True when `candidate` is a different host under the same registrable domain
/// as `page_host`.
pub fn is_related_subdomain(candidate: &str, page_host: &str) -> bool {
    if candidate.eq_ignore_ascii_case(page_host) {
        return false;
    }
    match (registrable_domain(candidate), registrable_domain(page_host)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// True when both URLs point at the same host and port.
pub fn is_same_host(a: &Url, b: &Url) -> bool {
    a.host_str().is_some()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
