// Static fetch with rendered-fetch fallback

use crate::error::{Result, ScanError};
use crate::renderer::Renderer;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const USER_AGENT: &str = "Spyglass/0.1 (+https://github.com/trapdoorsec/spyglass)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 15;

/// Where a page's markup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Static,
    Rendered,
}

/// A page with usable markup.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; base for resolving references.
    pub final_url: Url,
    pub body: String,
    /// Response headers. Rendered fetches carry none.
    pub headers: Option<HeaderMap>,
    pub source: FetchSource,
}

pub struct FetchStrategy {
    client: Client,
    renderer: Option<Arc<dyn Renderer>>,
    render_timeout: Duration,
}

impl FetchStrategy {
    /// Build the HTTP client. Certificate validation is disabled: recon
    /// targets routinely present self-signed or mismatched certificates.
    pub fn new(timeout: Duration, request_headers: HeaderMap) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(request_headers)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .danger_accept_invalid_certs(true)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            renderer: None,
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Static fetch first, rendered fetch second. Every failure is final for
    /// this URL and reported as `None`.
    pub async fn fetch(&self, url: &Url) -> Option<FetchedPage> {
        match self.fetch_static(url).await {
            Ok(page) => return Some(page),
            Err(ScanError::ContentTypeMismatch { content_type, .. }) => {
                debug!("{} is not markup ({:?})", url, content_type);
            }
            Err(e) => debug!("Static fetch of {} failed: {}", url, e),
        }

        let renderer = self.renderer.as_ref()?;
        match self.fetch_rendered(renderer.as_ref(), url).await {
            Ok(page) => Some(page),
            Err(e) => {
                debug!("Rendered fetch of {} failed: {}", url, e);
                None
            }
        }
    }

    pub async fn fetch_static(&self, url: &Url) -> Result<FetchedPage> {
        debug!("Fetching {}", url);
        let response = self.client.get(url.as_str()).send().await?;

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
        {
            return Err(ScanError::ContentTypeMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ScanError::EmptyDocument(url.to_string()));
        }

        Ok(FetchedPage {
            final_url,
            body,
            headers: Some(headers),
            source: FetchSource::Static,
        })
    }

    /// Render in a fresh context that is closed on every path out.
    pub async fn fetch_rendered(&self, renderer: &dyn Renderer, url: &Url) -> Result<FetchedPage> {
        debug!("Rendering {}", url);
        let mut context = renderer
            .new_context()
            .await
            .map_err(|e| ScanError::RenderingUnavailable(e.to_string()))?;

        let timeout_ms = self.render_timeout.as_millis() as u64;
        let rendered = match context.navigate(url.as_str(), timeout_ms).await {
            Ok(final_url) => context.get_html().await.map(|html| (final_url, html)),
            Err(e) => Err(e),
        };

        if let Err(e) = context.close().await {
            debug!("Closing render context for {} failed: {}", url, e);
        }

        let (final_url, body) = rendered.map_err(|e| ScanError::RenderFailed(e.to_string()))?;
        if body.trim().is_empty() {
            return Err(ScanError::EmptyDocument(url.to_string()));
        }

        Ok(FetchedPage {
            final_url: Url::parse(&final_url).unwrap_or_else(|_| url.clone()),
            body,
            headers: None,
            source: FetchSource::Rendered,
        })
    }

    /// Fetch a script body for endpoint mining. Anything other than a 200
    /// JavaScript response yields an empty string.
    pub async fn fetch_script(&self, url: &str) -> String {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Script fetch of {} failed: {}", url, e);
                return String::new();
            }
        };

        let is_javascript = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("javascript"));

        if response.status() != reqwest::StatusCode::OK || !is_javascript {
            return String::new();
        }

        response.text().await.unwrap_or_default()
    }
}
