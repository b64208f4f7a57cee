// Request configuration parsed from the command line

use crate::error::{CoreError, Result};
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};

/// Split a `Name: Value` header at the first colon.
pub fn parse_auth_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| CoreError::InvalidHeader(format!("expected 'Name: Value', got '{}'", raw)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidHeader(format!("missing header name in '{}'", raw)));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse `k=v; k2=v2` into ordered pairs. Entries without `=` are skipped and
/// a repeated key keeps its first position but takes the last value.
pub fn parse_cookie_string(raw: &str) -> Vec<(String, String)> {
    let mut cookies: Vec<(String, String)> = Vec::new();

    for pair in raw.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().to_string();

        match cookies.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value,
            None => cookies.push((key.to_string(), value)),
        }
    }

    cookies
}

/// Headers attached to every page and script request of a run.
pub fn build_request_headers(auth_header: Option<&str>, cookie: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(raw) = auth_header {
        let (name, value) = parse_auth_header(raw)?;
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CoreError::InvalidHeader(format!("{}: {}", name, e)))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|e| CoreError::InvalidHeader(format!("{}: {}", value, e)))?;
        headers.insert(name, value);
    }

    if let Some(raw) = cookie {
        let cookies = parse_cookie_string(raw);
        if !cookies.is_empty() {
            let joined = cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            let value = HeaderValue::from_str(&joined)
                .map_err(|e| CoreError::InvalidHeader(format!("cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }
    }

    Ok(headers)
}
