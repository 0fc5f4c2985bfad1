//! Remote feed access.
//!
//! The pipeline only sees the [`EventSource`] trait. The HTTP side lives
//! here: access-token scraping, request headers, the query payload. The
//! source handles its own failures — a run that cannot fetch reports why
//! and yields nothing, and the pipeline treats that as a no-op.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Matches the token embedded in the drops page markup: "accessToken":"..."
static ACCESS_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""accessToken":"([^"]+)""#).expect("Invalid token regex"));

/// Where raw feed payloads come from.
#[async_trait]
pub trait EventSource {
    /// Fetch the raw feed response. `None` means the source had nothing to
    /// offer this run; the caller treats that as a no-op, not an error.
    async fn fetch(&self) -> Result<Option<serde_json::Value>>;
}

/// The real feed: a POST endpoint guarded by a bearer token that is
/// republished inside the drops page markup on every deploy.
pub struct HttpSource {
    client: reqwest::Client,
    post_url: String,
    token_url: Option<String>,
    headers: HashMap<String, String>,
    payload: serde_json::Value,
}

impl HttpSource {
    pub fn new(config: &Config) -> Self {
        HttpSource {
            client: reqwest::Client::new(),
            post_url: config.post_url.clone(),
            token_url: config.token_url.clone(),
            headers: config.headers.clone(),
            payload: config.payload.clone(),
        }
    }

    /// Scrape the access token out of the drops page.
    async fn fetch_access_token(&self, url: &str) -> Result<String> {
        println!("Fetching access token from {}...", url);

        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Failed to fetch {}", url))?
            .text()
            .await
            .context("Failed to read token page body")?;

        ACCESS_TOKEN_RE
            .captures(&body)
            .and_then(|captures| captures.get(1))
            .map(|token| token.as_str().to_string())
            .context("Could not find \"accessToken\" in the page source")
    }

    /// Request headers for the feed query, with the scraped token injected
    /// when one could be obtained.
    async fn request_headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();

        if let Some(ref url) = self.token_url {
            match self.fetch_access_token(url).await {
                Ok(token) => {
                    headers.insert("authorization".to_string(), format!("Bearer {}", token));
                }
                Err(err) => {
                    println!(
                        "Warning: token fetch failed ({:#}); using configured headers as-is.",
                        err
                    );
                }
            }
        }

        headers
    }
}

#[async_trait]
impl EventSource for HttpSource {
    async fn fetch(&self) -> Result<Option<serde_json::Value>> {
        let headers = self.request_headers().await;

        println!("Sending POST request to {}...", self.post_url);

        let mut request = self.client.post(&self.post_url).json(&self.payload);
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = match request
            .send()
            .await
            .and_then(|response| response.error_for_status())
        {
            Ok(response) => response,
            Err(err) => {
                println!("Error fetching feed: {}", err);
                return Ok(None);
            }
        };

        match response.json().await {
            Ok(payload) => Ok(Some(payload)),
            Err(err) => {
                println!("Error decoding feed response: {}", err);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_regex_extracts_token() {
        let html = r#"<script>window.__STATE__={"auth":{"accessToken":"abc-123","expires":900}}</script>"#;

        let token = ACCESS_TOKEN_RE
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|token| token.as_str());

        assert_eq!(token, Some("abc-123"));
    }

    #[test]
    fn test_token_regex_misses_cleanly() {
        assert!(ACCESS_TOKEN_RE.captures("<html>no token here</html>").is_none());
    }
}
