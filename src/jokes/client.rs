//! Joke provider backed by icanhazdadjoke.com.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use crate::assistant::JokeProvider;
use crate::assistant::capabilities::JokeError;
use crate::config::AppConfig;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP joke source. Failures are reported as [`JokeError`]; the responder
/// falls back to a hardcoded joke.
pub struct DadJokeClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct JokeResponse {
    #[serde(default)]
    joke: String,
}

impl DadJokeClient {
    /// Create a new joke client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("kiddobot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for jokes")?;

        Ok(Self { http, base_url: config.joke_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl JokeProvider for DadJokeClient {
    async fn joke(&self) -> Result<String, JokeError> {
        debug!("Fetching a joke from {}", self.base_url);

        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| JokeError(e.to_string()))?
            .error_for_status()
            .map_err(|e| JokeError(e.to_string()))?;

        let body: JokeResponse = response.json().await.map_err(|e| JokeError(e.to_string()))?;

        if body.joke.trim().is_empty() {
            return Err(JokeError("empty joke in response".to_string()));
        }

        Ok(body.joke)
    }
}
