use crate::error::{CoreError, Result};
use crate::wayback::WaybackClient;
use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::HeaderMap;
use spyglass_scanner::{ChromiumRenderer, Crawler, NoopRenderer, PageRecord, ScanError};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub seeds: Vec<Url>,
    pub workers: usize,
    pub max_depth: usize,
    pub use_js: bool,
    pub filter: bool,
    pub request_headers: HeaderMap,
    pub timeout: Duration,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(seeds: Vec<Url>) -> Self {
        Self {
            seeds,
            workers: 10,
            max_depth: 1,
            use_js: false,
            filter: false,
            request_headers: HeaderMap::new(),
            timeout: Duration::from_secs(10),
            show_progress_bars: false,
        }
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// The seed followed by any archived URLs, seed first.
pub async fn collect_seeds(seed: &Url, wayback: Option<&WaybackClient>) -> Vec<Url> {
    let mut seeds = vec![seed.clone()];
    if let Some(client) = wayback {
        let mut archived: Vec<Url> = client
            .archived_urls(seed)
            .await
            .into_iter()
            .filter(|url| url != seed)
            .collect();
        archived.sort();
        info!("Adding {} archived URLs as seeds", archived.len());
        seeds.extend(archived);
    }
    seeds
}

/// A configured crawler plus the progress reporting around it.
///
/// The crawler stays reachable while a run is in progress so an interrupted
/// run can still hand back what it collected.
pub struct CrawlRun {
    crawler: Crawler,
    seeds: Vec<Url>,
    workers: usize,
    progress_bar: Option<ProgressBar>,
    processed: Arc<AtomicUsize>,
}

impl CrawlRun {
    pub async fn prepare(options: CrawlOptions) -> Self {
        let CrawlOptions {
            seeds,
            workers,
            max_depth,
            use_js,
            filter,
            request_headers,
            timeout,
            show_progress_bars,
        } = options;

        let progress_bar = show_progress_bars.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Starting crawl...");
            pb
        });

        let processed = Arc::new(AtomicUsize::new(0));
        let progress_callback: spyglass_scanner::ProgressCallback = match progress_bar {
            Some(ref pb) => {
                let pb = pb.clone();
                let count = processed.clone();
                Arc::new(move |_worker_id: usize, url: String| {
                    let count = count.fetch_add(1, Ordering::Relaxed) + 1;
                    pb.set_message(format!("Crawling... {} URLs processed ({})", count, url));
                })
            }
            None => {
                let count = processed.clone();
                Arc::new(move |_worker_id: usize, _url: String| {
                    count.fetch_add(1, Ordering::Relaxed);
                })
            }
        };

        let mut crawler = Crawler::new()
            .with_max_depth(max_depth)
            .with_timeout(timeout)
            .with_request_headers(request_headers)
            .with_category_filter(filter)
            .with_progress_callback(progress_callback);

        if use_js {
            match ChromiumRenderer::launch().await {
                Ok(renderer) => {
                    info!("JavaScript rendering enabled");
                    crawler = crawler.with_renderer(Arc::new(renderer));
                }
                Err(e) => {
                    warn!("Rendering unavailable, continuing with static fetches only: {:#}", e);
                    if let Some(ref pb) = progress_bar {
                        pb.println(format!(
                            "{} JavaScript rendering unavailable: {}",
                            "[!]".yellow().bold(),
                            e
                        ));
                    }
                    crawler = crawler.with_renderer(Arc::new(NoopRenderer));
                }
            }
        }

        Self {
            crawler,
            seeds,
            workers,
            progress_bar,
            processed,
        }
    }

    /// Crawl every seed to completion.
    pub async fn execute(&self) -> Result<Vec<PageRecord>> {
        let outcome = self.crawler.crawl_all(self.seeds.clone(), self.workers).await;

        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(format!(
                "Crawl complete! {} URLs processed",
                self.processed.load(Ordering::Relaxed)
            ));
        }

        match outcome {
            Ok(results) => Ok(results),
            Err(ScanError::EmptySeed) => Err(CoreError::EmptySeed),
            Err(e) => Err(e.into()),
        }
    }

    /// Stop the workers and return the records collected so far.
    pub async fn interrupt(&self) -> Vec<PageRecord> {
        self.crawler.abort().await;
        if let Some(ref pb) = self.progress_bar {
            pb.abandon_with_message("Crawl interrupted");
        }
        self.crawler.get_results()
    }
}

/// Execute a crawl with the given options
pub async fn execute_crawl(options: CrawlOptions) -> Result<Vec<PageRecord>> {
    CrawlRun::prepare(options).await.execute().await
}

/// Distinct record URLs in the order they were crawled.
pub fn collected_urls(results: &[PageRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| seen.insert(r.url.as_str()))
        .map(|r| r.url.clone())
        .collect()
}

/// Generate a crawl report from results
pub fn generate_crawl_report(results: &[PageRecord]) -> String {
    let divider = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n";
    let mut report = String::new();
    report.push_str(divider);
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages crawled: {}\n", results.len()));

    let total_links: usize = results.iter().map(|r| r.links.len()).sum();
    report.push_str(&format!("  Total links found: {}\n", total_links));

    let total_forms: usize = results.iter().map(|r| r.forms.len()).sum();
    report.push_str(&format!("  Total forms found: {}\n", total_forms));

    let total_scripts: usize = results.iter().map(|r| r.js_files.len()).sum();
    report.push_str(&format!("  Total scripts found: {}\n", total_scripts));

    let endpoints: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| r.js_endpoints.iter().map(String::as_str))
        .collect();
    report.push_str(&format!("  JS endpoints: {}\n", endpoints.len()));

    let subdomains: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| r.subdomains.iter().map(String::as_str))
        .collect();
    report.push_str(&format!("  Subdomains: {}\n", subdomains.len()));

    let parameters: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| r.parameters.iter().map(String::as_str))
        .collect();
    report.push_str(&format!("  Parameters: {}\n", parameters.len()));

    let technologies: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| r.technologies.iter().map(String::as_str))
        .collect();
    if technologies.is_empty() {
        report.push_str("  Technologies: none detected\n");
    } else {
        let list: Vec<&str> = technologies.into_iter().collect();
        report.push_str(&format!("  Technologies: {}\n", list.join(", ")));
    }

    report.push('\n');
    report.push_str(divider);

    let mut by_host: BTreeMap<String, Vec<&PageRecord>> = BTreeMap::new();
    for result in results {
        if let Ok(url) = Url::parse(&result.url)
            && let Some(host) = url.host_str()
        {
            by_host.entry(host.to_string()).or_default().push(result);
        }
    }

    for (host, host_results) in by_host.iter() {
        report.push_str(&format!("## {}\n", host.bright_white().bold()));
        report.push_str(&format!("  {} pages found\n\n", host_results.len()));

        for result in host_results {
            let mut line = format!("  {}", extract_url_path(&result.url));
            if !result.forms.is_empty() {
                line.push_str(&format!(" {}", format!("[{} forms]", result.forms.len()).cyan()));
            }
            if !result.parameters.is_empty() {
                line.push_str(&format!(" {}", format!("?{}", result.parameters.join("&")).bright_black()));
            }
            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report.push_str(&format!(
        "Report generated at {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report
}
