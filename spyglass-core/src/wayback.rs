// Historical URL lookup against the Wayback Machine CDX index

use spyglass_scanner::domain::registrable_domain;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const WAYBACK_ENDPOINT: &str = "https://web.archive.org";

pub struct WaybackClient {
    client: reqwest::Client,
    endpoint: String,
}

impl WaybackClient {
    pub fn new() -> Self {
        Self::with_endpoint(WAYBACK_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Archived URLs for the seed's registrable domain, or its host when it
    /// has none. Any failure yields an empty set.
    pub async fn archived_urls(&self, seed: &Url) -> HashSet<Url> {
        let Some(host) = seed.host_str() else {
            return HashSet::new();
        };
        let domain = registrable_domain(host).unwrap_or_else(|| host.to_string());

        let query = format!(
            "{}/cdx/search/cdx?url={}/*&output=text&fl=original&collapse=urlkey",
            self.endpoint, domain
        );
        debug!("Querying wayback index: {}", query);

        let body = match self.client.get(&query).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Failed to read wayback response for {}: {}", domain, e);
                    return HashSet::new();
                }
            },
            Ok(response) => {
                warn!("Wayback lookup for {} returned {}", domain, response.status());
                return HashSet::new();
            }
            Err(e) => {
                warn!("Wayback lookup for {} failed: {}", domain, e);
                return HashSet::new();
            }
        };

        parse_cdx_lines(&body)
    }
}

impl Default for WaybackClient {
    fn default() -> Self {
        Self::new()
    }
}

/// One URL per line; unparseable lines are dropped.
pub fn parse_cdx_lines(body: &str) -> HashSet<Url> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| Url::parse(line).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .collect()
}
