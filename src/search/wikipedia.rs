//! Wikipedia summary client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::assistant::KnowledgeProvider;
use crate::assistant::capabilities::SearchError;
use crate::config::AppConfig;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Knowledge provider backed by the Wikipedia REST summary endpoint.
pub struct WikipediaClient {
    http: reqwest::Client,
    base_url: String,
    sentences: usize,
}

/// Relevant fields of `GET /api/rest_v1/page/summary/{title}`.
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "type", default)]
    page_type: String,
    #[serde(default)]
    extract: String,
}

impl WikipediaClient {
    /// Create a new Wikipedia client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("kiddobot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for Wikipedia")?;

        Ok(Self { http, base_url: config.wikipedia_url.trim_end_matches('/').to_string(), sentences: config.search_sentences })
    }

    async fn fetch_summary(&self, topic: &str) -> Result<SummaryResponse, SearchError> {
        let url = format!("{}/api/rest_v1/page/summary/{}?redirect=true", self.base_url, urlencoding::encode(topic));
        debug!("Searching Wikipedia: {}", url);

        let response = self.http.get(&url).send().await.map_err(|e| SearchError::Provider(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SearchError::NotFound(topic.to_string()));
        }
        if !response.status().is_success() {
            return Err(SearchError::Provider(format!("unexpected status {}", response.status())));
        }

        response.json().await.map_err(|e| SearchError::Provider(e.to_string()))
    }
}

#[async_trait]
impl KnowledgeProvider for WikipediaClient {
    async fn search(&self, topic: &str) -> Result<String, SearchError> {
        let summary = self.fetch_summary(topic).await?;
        summarize(topic, &summary, self.sentences)
    }
}

/// Turn a summary response into reply text, bounded to `sentences` sentences.
fn summarize(topic: &str, response: &SummaryResponse, sentences: usize) -> Result<String, SearchError> {
    // The REST summary API reports disambiguation pages via the type field
    // and does not expose the candidate articles.
    if response.page_type == "disambiguation" {
        return Err(SearchError::Ambiguous(topic.to_string()));
    }

    let text = first_sentences(&response.extract, sentences);
    if text.is_empty() {
        return Err(SearchError::NotFound(topic.to_string()));
    }

    Ok(text)
}

/// Take the first `count` sentences of a text.
fn first_sentences(text: &str, count: usize) -> String {
    split_sentences(text).into_iter().take(count).collect::<Vec<_>>().join(" ")
}

/// Split text into sentences on terminal punctuation.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        current.push(c);

        if c == '.' || c == '!' || c == '?' || c == '\n' {
            let trimmed = current.trim().to_string();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
            current.clear();
        }
    }

    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One. Two! Three? Four");
        assert_eq!(sentences, ["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn test_first_sentences_truncates() {
        assert_eq!(first_sentences("One. Two. Three.", 2), "One. Two.");
    }

    #[test]
    fn test_first_sentences_short_text() {
        assert_eq!(first_sentences("Just one.", 2), "Just one.");
    }

    #[test]
    fn test_summarize_standard_page() {
        let response = SummaryResponse { page_type: "standard".into(), extract: "Rust is a language. It is fast. It is safe.".into() };
        assert_eq!(summarize("rust", &response, 2).unwrap(), "Rust is a language. It is fast.");
    }

    #[test]
    fn test_summarize_disambiguation_is_ambiguous() {
        let response = SummaryResponse { page_type: "disambiguation".into(), extract: "Mercury may refer to:".into() };
        assert!(matches!(summarize("mercury", &response, 2), Err(SearchError::Ambiguous(_))));
    }

    #[test]
    fn test_summarize_empty_extract_is_not_found() {
        let response = SummaryResponse { page_type: "standard".into(), extract: String::new() };
        assert!(matches!(summarize("xyzzy", &response, 2), Err(SearchError::NotFound(_))));
    }
}
