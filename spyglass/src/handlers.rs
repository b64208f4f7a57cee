use clap::ArgMatches;
use colored::Colorize;
use spyglass_core::CoreError;
use spyglass_core::config::build_request_headers;
use spyglass_core::crawl::{
    CrawlOptions, CrawlRun, collect_seeds, collected_urls, generate_crawl_report,
};
use spyglass_core::nuclei::NucleiRunner;
use spyglass_core::sink::{OutputFormat, save_results};
use spyglass_core::wayback::WaybackClient;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Everything a run needs, taken from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub url: Url,
    pub depth: usize,
    pub threads: usize,
    pub timeout: Duration,
    pub auth_header: Option<String>,
    pub cookie: Option<String>,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub use_js: bool,
    pub filter: bool,
    pub wayback: bool,
    pub nuclei: bool,
    pub quiet: bool,
    pub verbosity: u8,
}

impl RunConfig {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, String> {
        let raw_url = matches
            .get_one::<String>("url")
            .ok_or_else(|| "--url is required".to_string())?;
        let url = parse_url_line(raw_url.trim())
            .ok_or_else(|| format!("No valid seed URL in '{}'", raw_url))?;

        let output = matches
            .get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("output.json");
        let format = matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("json")
            .parse::<OutputFormat>()
            .map_err(|e| e.to_string())?;

        Ok(Self {
            url,
            depth: matches.get_one::<usize>("depth").copied().unwrap_or(1),
            threads: matches.get_one::<usize>("threads").copied().unwrap_or(10),
            timeout: Duration::from_secs(matches.get_one::<u64>("timeout").copied().unwrap_or(10)),
            auth_header: matches.get_one::<String>("auth-header").cloned(),
            cookie: matches.get_one::<String>("cookie").cloned(),
            output: PathBuf::from(shellexpand::tilde(output).as_ref()),
            format,
            use_js: matches.get_flag("use-js"),
            filter: matches.get_flag("filter"),
            wayback: matches.get_flag("wayback"),
            nuclei: matches.get_flag("nuclei"),
            quiet: matches.get_flag("quiet"),
            verbosity: matches.get_count("verbose"),
        })
    }
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<Url> {
    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some()
    {
        return Some(url);
    }

    let with_scheme = format!("http://{}", line);
    Url::parse(&with_scheme)
        .ok()
        .filter(|url| url.host_str().is_some_and(|host| !host.is_empty()))
}

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_error(msg: &str) {
    eprintln!("{} {}", "[x]".red().bold(), msg);
}

fn print_warning(msg: &str) {
    eprintln!("{} {}", "[!]".yellow().bold(), msg);
}

/// Run one crawl end to end and return the process exit code.
pub async fn handle_crawl(config: RunConfig) -> i32 {
    let request_headers =
        match build_request_headers(config.auth_header.as_deref(), config.cookie.as_deref()) {
            Ok(headers) => headers,
            Err(e) => {
                print_error(&e.to_string());
                return 1;
            }
        };

    if !config.quiet {
        println!(
            "\n{} Crawling {}",
            "→".blue(),
            config.url.as_str().bright_white()
        );
        println!("  Workers: {}", config.threads);
        println!("  Max depth: {}\n", config.depth);
    }

    let wayback = config.wayback.then(WaybackClient::new);
    let seeds = collect_seeds(&config.url, wayback.as_ref()).await;
    debug!("Crawling {} seed(s)", seeds.len());

    let options = CrawlOptions {
        seeds,
        workers: config.threads,
        max_depth: config.depth,
        use_js: config.use_js,
        filter: config.filter,
        request_headers,
        timeout: config.timeout,
        show_progress_bars: !config.quiet,
    };
    let run = CrawlRun::prepare(options).await;

    let results = tokio::select! {
        outcome = run.execute() => match outcome {
            Ok(results) => results,
            Err(CoreError::EmptySeed) => {
                print_error("No seed URLs to crawl");
                return 1;
            }
            Err(e) => {
                print_error(&format!("Crawl failed: {}", e));
                return 1;
            }
        },
        _ = tokio::signal::ctrl_c() => {
            let partial = run.interrupt().await;
            print_warning(&format!(
                "Interrupted, saving {} records collected so far",
                partial.len()
            ));
            partial
        }
    };
    // releases the browser before any follow-up work
    drop(run);

    if let Err(e) = save_results(&results, &config.output, config.format) {
        print_error(&format!(
            "Failed to write results to {}: {}",
            config.output.display(),
            e
        ));
        return 1;
    }
    info!("Saved {} records to {}", results.len(), config.output.display());

    if !config.quiet {
        println!("{}", generate_crawl_report(&results));
        println!(
            "{} Results saved to {}",
            "✓".green().bold(),
            config.output.display().to_string().bright_white()
        );
    }

    if config.nuclei {
        run_nuclei(&collected_urls(&results), config.quiet).await;
    }

    0
}

async fn run_nuclei(urls: &[String], quiet: bool) {
    if !quiet {
        println!("\n{} Running nuclei scan...", "→".blue());
    }

    match NucleiRunner::new().run(urls).await {
        Ok(results_path) => {
            if !quiet {
                println!(
                    "{} Nuclei scan completed. Results saved to {}",
                    "✓".green().bold(),
                    results_path.display()
                );
            }
        }
        Err(CoreError::ToolMissing(tool)) => print_warning(&format!(
            "{} not found. Please install it from https://github.com/projectdiscovery/nuclei",
            tool
        )),
        Err(e) => print_warning(&format!("Nuclei scan failed: {}", e)),
    }
}
