// Shared test doubles

use crate::renderer::{RenderContext, Renderer};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Renderer returning fixed markup and counting open contexts. With no
/// markup every navigation fails.
pub struct FakeRenderer {
    html: Option<String>,
    open: Arc<AtomicUsize>,
    pub created: AtomicUsize,
}

impl FakeRenderer {
    pub fn new(html: Option<&str>) -> Self {
        Self {
            html: html.map(str::to_string),
            open: Arc::new(AtomicUsize::new(0)),
            created: AtomicUsize::new(0),
        }
    }
}

struct FakeContext {
    html: Option<String>,
    open: Arc<AtomicUsize>,
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> anyhow::Result<Box<dyn RenderContext>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeContext {
            html: self.html.clone(),
            open: self.open.clone(),
        }))
    }

    fn active_contexts(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> anyhow::Result<String> {
        match self.html {
            Some(_) => Ok(url.to_string()),
            None => anyhow::bail!("navigation timed out"),
        }
    }

    async fn get_html(&self) -> anyhow::Result<String> {
        Ok(self.html.clone().unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.open.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
