//! LLM module for the fallback intent.
//!
//! Free-form questions that match no keyword rule are answered by a local
//! LLM through RIG's Ollama provider.

mod client;

pub use client::LlmClient;
