pub mod crawler;
pub mod domain;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod frontier;
pub mod renderer;
pub mod result;

#[cfg(test)]
pub(crate) mod test_utils;

pub use crawler::{Crawler, ProgressCallback, ResultCallback};
pub use error::ScanError;
pub use filter::FilteredLinks;
pub use renderer::{NoopRenderer, Renderer, chromium::ChromiumRenderer};
pub use result::{FormRecord, HeaderSummary, PageRecord};
