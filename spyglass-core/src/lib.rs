use colored::Colorize;

pub mod config;
pub mod crawl;
pub mod error;
pub mod nuclei;
pub mod sink;
pub mod wayback;

pub use error::{CoreError, Result};

const BANNER: &str = r#"
   ___ _ __  _   _  __ _| | __ _ ___ ___
  / __| '_ \| | | |/ _` | |/ _` / __/ __|
  \__ \ |_) | |_| | (_| | | (_| \__ \__ \
  |___/ .__/ \__, |\__, |_|\__,_|___/___/
      |_|    |___/ |___/
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "recursive web recon crawler".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
