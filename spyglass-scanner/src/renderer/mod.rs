//! Browser rendering seam used by the fetch strategy's fallback step.
//!
//! A [`Renderer`] hands out isolated [`RenderContext`]s; the caller owns each
//! context and must close it whether or not navigation succeeded.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a new isolated context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Number of currently open contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context used for one rendered fetch.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL, returning the final URL after redirects.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<String>;
    /// Get the rendered document.
    async fn get_html(&self) -> Result<String>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Renderer used when no browser is available; every request fails.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("browser not available"))
    }

    fn active_contexts(&self) -> usize {
        0
    }
}
