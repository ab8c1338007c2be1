//! LLM client using RIG with Ollama provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rig::agent::Agent;
use rig::client::{CompletionClient, Nothing};
use rig::message::Message;
use rig::providers::ollama;
use serde_json::json;
use tracing::{debug, info};

use crate::assistant::GeneralProvider;
use crate::assistant::capabilities::AskError;
use crate::config::AppConfig;

/// General question-answering provider for the fallback intent.
/// Uses RIG framework for simplified LLM interactions.
pub struct LlmClient {
    agent: Agent<ollama::CompletionModel>, // RIG agent with Ollama backend
    history: Vec<Message>,                 // Conversation history
    max_history: usize,                    // Maximum history length
}

impl LlmClient {
    /// Create a new LLM client.
    ///
    /// # Errors
    /// Returns an error if failed to create Ollama client. This is the only
    /// fatal provider failure: it aborts startup instead of degrading.
    pub fn new(config: &AppConfig) -> Result<Self> {
        info!("Connecting to Ollama at {}", config.ollama_url);
        info!("Using model: {}", config.ollama_model);

        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(&config.ollama_url)
            .build()
            .context("Failed to create Ollama client")?;

        // Keep the context window and token budget small; replies must stay
        // short enough for speech output.
        let agent = client
            .agent(&config.ollama_model)
            .preamble(&config.system_prompt)
            .temperature(config.temperature as f64)
            .additional_params(json!({
                "num_ctx": 1024,
                "num_predict": 150
            }))
            .build();

        Ok(Self { agent, history: Vec::new(), max_history: config.max_llm_history })
    }

    /// Send a message and get the complete response, updating the bounded
    /// conversation history.
    async fn chat(&mut self, message: &str) -> Result<String> {
        debug!("User: {}", message);

        use rig::completion::Chat;

        let response = self.agent.chat(message, self.history.clone()).await.context("LLM request failed")?;

        debug!("Assistant: {}", response);

        // Update history
        self.history.push(Message::user(message));
        self.history.push(Message::assistant(&response));

        // Trim history if needed
        while self.history.len() > self.max_history * 2 {
            self.history.remove(0);
            if !self.history.is_empty() {
                self.history.remove(0);
            }
        }

        Ok(response)
    }
}

#[async_trait]
impl GeneralProvider for LlmClient {
    async fn ask(&mut self, question: &str) -> Result<String, AskError> {
        let response = self.chat(question).await.map_err(|e| AskError::Provider(format!("{e:#}")))?;

        if response.trim().is_empty() {
            return Err(AskError::EmptyResponse);
        }

        Ok(response)
    }
}
