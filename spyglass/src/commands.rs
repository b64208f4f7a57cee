use crate::CLAP_STYLING;
use clap::{ArgAction, arg};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("spyglass")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("spyglass")
        .about(
            "Recursively crawl a site and harvest links, scripts, forms, subdomains, JS \
            endpoints, technologies and query parameters.",
        )
        .styles(CLAP_STYLING)
        .arg(
            arg!(-u --"url" <URL>)
                .required(true)
                .help("The seed URL to crawl"),
        )
        .arg(
            arg!(-d --"depth" <DEPTH>)
                .required(false)
                .help("Maximum number of hops from the seed")
                .value_parser(clap::value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            arg!(--"auth-header" <HEADER>)
                .required(false)
                .help("Header sent with every request, as 'Name: Value'"),
        )
        .arg(
            arg!(--"cookie" <COOKIES>)
                .required(false)
                .help("Cookies sent with every request, as 'k=v; k2=v2'"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("File to write the results to")
                .default_value("output.json"),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Output format: json, csv")
                .value_parser(["json", "csv"])
                .default_value("json"),
        )
        .arg(
            arg!(--"use-js")
                .required(false)
                .help("Render pages in headless Chromium when the static fetch yields nothing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"filter")
                .required(false)
                .help("Bucket discovered links into xss, sqli, lfi, ssrf and redirect candidates")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"wayback")
                .required(false)
                .help("Seed the crawl with URLs from the Wayback Machine")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"nuclei")
                .required(false)
                .help("Run nuclei against the crawled URLs afterwards")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-t --"threads" <NUM_WORKERS>)
                .required(false)
                .help("The number of async worker 'threads' in the worker pool.")
                .value_parser(clap::value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug)")
                .required(false)
                .action(ArgAction::Count),
        )
}
