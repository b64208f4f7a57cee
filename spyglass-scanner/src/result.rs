use crate::filter::FilteredLinks;
use serde::{Deserialize, Serialize};

/// A form discovered on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub action: String,
    pub method: String,
}

/// Security posture taken from the response headers. Absent headers are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSummary {
    pub csp: String,
    pub x_frame: String,
    pub x_content_type: String,
}

/// Everything learned from crawling one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub links: Vec<String>,
    pub js_files: Vec<String>,
    pub forms: Vec<FormRecord>,
    pub subdomains: Vec<String>,
    pub js_endpoints: Vec<String>,
    pub technologies: Vec<String>,
    pub headers: HeaderSummary,
    pub parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered: Option<FilteredLinks>,
}

impl PageRecord {
    pub fn new(url: String) -> Self {
        Self {
            url,
            links: Vec::new(),
            js_files: Vec::new(),
            forms: Vec::new(),
            subdomains: Vec::new(),
            js_endpoints: Vec::new(),
            technologies: Vec::new(),
            headers: HeaderSummary::default(),
            parameters: Vec::new(),
            filtered: None,
        }
    }
}
