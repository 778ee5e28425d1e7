// =============================================================================
// providers/http.rs — ONE HTTP CLIENT TO RULE THEM ALL
// =============================================================================
//
// All built-in providers share a single reqwest client (it is an Arc inside,
// cloning is free). Courier websites are considerably friendlier to requests
// that look like they came from a browser, hence the header collection.
// =============================================================================

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA,
};
use reqwest::Response;

use crate::config::Config;
use crate::error::FetchError;

/// Build the shared client with the configured timeout and user agent.
pub fn build_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("no-cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-site"),
    );

    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .build()
}

/// Turn a non-2xx answer into [`FetchError::Status`].
pub fn ensure_success(provider: &str, response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
        })
    }
}
