use spyglass::{RunConfig, command_argument_builder, handle_crawl, init_logging};
use spyglass_core::print_banner;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();

    let config = match RunConfig::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.verbosity);

    // Show banner unless --quiet flag is set
    if !config.quiet {
        print_banner();
    }

    let code = handle_crawl(config).await;
    std::process::exit(code);
}
