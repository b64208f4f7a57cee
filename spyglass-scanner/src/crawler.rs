use crate::domain::{is_same_host, url_identity};
use crate::error::{Result, ScanError};
use crate::extract::{
    detect_subdomains, detect_technologies, extract_elements, extract_parameters,
    parse_js_endpoints, summarize_headers,
};
use crate::fetch::{DEFAULT_TIMEOUT_SECS, FetchStrategy, FetchedPage};
use crate::filter::apply_filters;
use crate::frontier::{Frontier, FrontierEntry, VisitTracker};
use crate::renderer::Renderer;
use crate::result::PageRecord;
use futures::future::join_all;
use reqwest::header::HeaderMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, info};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(&PageRecord) + Send + Sync>;

/// State owned by one crawl run and shared with its workers.
struct CrawlState {
    frontier: Frontier,
    tracker: VisitTracker,
    results: Arc<Mutex<Vec<PageRecord>>>,
}

pub struct Crawler {
    results: Arc<Mutex<Vec<PageRecord>>>,
    workers: Mutex<Vec<AbortHandle>>,
    max_depth: usize,
    timeout: Duration,
    render_timeout: Option<Duration>,
    request_headers: HeaderMap,
    renderer: Option<Arc<dyn Renderer>>,
    categorize: bool,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
            workers: Mutex::new(Vec::new()),
            max_depth: 1,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            render_timeout: None,
            request_headers: HeaderMap::new(),
            renderer: None,
            categorize: false,
            progress_callback: None,
            result_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = Some(timeout);
        self
    }

    /// Headers sent with every page and script request.
    pub fn with_request_headers(mut self, headers: HeaderMap) -> Self {
        self.request_headers = headers;
        self
    }

    /// Enables the rendered-fetch fallback.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Attach category buckets to every record.
    pub fn with_category_filter(mut self, enabled: bool) -> Self {
        self.categorize = enabled;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    fn build_strategy(&self) -> Result<FetchStrategy> {
        let mut strategy = FetchStrategy::new(self.timeout, self.request_headers.clone())?;
        if let Some(timeout) = self.render_timeout {
            strategy = strategy.with_render_timeout(timeout);
        }
        if let Some(ref renderer) = self.renderer {
            strategy = strategy.with_renderer(renderer.clone());
        }
        Ok(strategy)
    }

    pub async fn crawl(&self, start_url: &str, workers: usize) -> Result<Vec<PageRecord>> {
        let seed = Url::parse(start_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        self.crawl_all(vec![seed], workers).await
    }

    /// Crawl from every seed at depth 0 with a pool of `workers` tasks.
    /// Records are returned in completion order.
    pub async fn crawl_all(&self, seeds: Vec<Url>, workers: usize) -> Result<Vec<PageRecord>> {
        if seeds.is_empty() {
            return Err(ScanError::EmptySeed);
        }
        let workers = workers.max(1);
        info!(
            "Starting crawl of {} seed(s) with {} workers, max depth {}",
            seeds.len(),
            workers,
            self.max_depth
        );

        let strategy = Arc::new(self.build_strategy()?);
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        let state = Arc::new(CrawlState {
            frontier: Frontier::new(),
            tracker: VisitTracker::new(self.max_depth),
            results: self.results.clone(),
        });
        for seed in seeds {
            state.frontier.push(FrontierEntry::seed(seed));
        }

        let mut worker_set = JoinSet::new();
        let mut abort_handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let state = state.clone();
            let strategy = strategy.clone();
            let progress_cb = self.progress_callback.clone();
            let result_cb = self.result_callback.clone();
            let categorize = self.categorize;

            let handle = worker_set.spawn(async move {
                debug!("Worker {} started", worker_id);

                while let Some(entry) = state.frontier.next().await {
                    let _in_flight = state.frontier.completion_guard();

                    if !state.tracker.admit(&entry.url, entry.depth) {
                        debug!("[Worker {}] Skipping {} (visited or too deep)", worker_id, entry.url);
                        continue;
                    }

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, entry.url.to_string());
                    }

                    let Some(page) = strategy.fetch(&entry.url).await else {
                        continue;
                    };

                    // a redirect target is a URL identity of its own
                    if url_identity(&page.final_url) != url_identity(&entry.url)
                        && !state.tracker.admit(&page.final_url, entry.depth)
                    {
                        debug!(
                            "[Worker {}] Dropping {}: redirected to already visited {}",
                            worker_id, entry.url, page.final_url
                        );
                        continue;
                    }

                    let record = build_record(&strategy, &page, categorize).await;
                    let children = same_host_children(&entry, &record.links, &state.tracker);

                    if let Some(ref callback) = result_cb {
                        callback(&record);
                    }
                    state
                        .results
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push(record);

                    debug!("[Worker {}] Queuing {} links from {}", worker_id, children.len(), entry.url);
                    for child in children {
                        state.frontier.push(child);
                    }
                }

                debug!("Worker {} finished", worker_id);
            });
            abort_handles.push(handle);
        }
        *self.workers.lock().unwrap_or_else(|e| e.into_inner()) = abort_handles;

        while let Some(joined) = worker_set.join_next().await {
            match joined {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => debug!("Worker cancelled"),
                Err(e) => {
                    worker_set.abort_all();
                    return Err(e.into());
                }
            }
        }

        let results = self.get_results();
        info!(
            "Crawl complete. Visited {} URLs, {} pages with content",
            state.tracker.visited_count(),
            results.len()
        );
        Ok(results)
    }

    /// Cancel the workers of a run in progress and wait for them to stop.
    /// Records already collected stay available through [`Crawler::get_results`].
    pub async fn abort(&self) {
        let handles = std::mem::take(&mut *self.workers.lock().unwrap_or_else(|e| e.into_inner()));
        for handle in &handles {
            handle.abort();
        }
        while handles.iter().any(|handle| !handle.is_finished()) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        if !handles.is_empty() {
            info!("Aborted {} crawl workers", handles.len());
        }
    }

    /// Records collected so far by the current or most recent run.
    pub fn get_results(&self) -> Vec<PageRecord> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the full extraction pipeline over a fetched page.
pub async fn build_record(strategy: &FetchStrategy, page: &FetchedPage, categorize: bool) -> PageRecord {
    let elements = extract_elements(&page.body, &page.final_url);

    let scripts = join_all(
        elements
            .js_files
            .iter()
            .map(|script| strategy.fetch_script(script)),
    )
    .await;
    let mut seen = HashSet::new();
    let js_endpoints = scripts
        .iter()
        .flat_map(|js| parse_js_endpoints(js))
        .filter(|endpoint| seen.insert(endpoint.clone()))
        .collect();

    let mut record = PageRecord::new(page.final_url.to_string());
    record.subdomains = detect_subdomains(&page.final_url, &elements.links, &elements.js_files);
    record.technologies = detect_technologies(&page.body);
    record.headers = summarize_headers(page.headers.as_ref());
    record.parameters = extract_parameters(&elements.links);
    record.js_endpoints = js_endpoints;
    if categorize {
        record.filtered = Some(apply_filters(&elements.links));
    }
    record.links = elements.links;
    record.js_files = elements.js_files;
    record.forms = elements.forms;
    record
}

/// Links on the same host as the requested URL that are still worth queuing.
/// Admission itself happens when an entry is dequeued.
fn same_host_children(
    parent: &FrontierEntry,
    links: &[String],
    tracker: &VisitTracker,
) -> Vec<FrontierEntry> {
    let depth = parent.depth + 1;
    if depth > tracker.max_depth() {
        return Vec::new();
    }

    links
        .iter()
        .filter_map(|link| Url::parse(link).ok())
        .filter(|link| is_same_host(link, &parent.url))
        .filter(|link| !tracker.is_visited(link))
        .map(|link| FrontierEntry::new(link, depth))
        .collect()
}
