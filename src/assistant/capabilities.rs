//! Capability interfaces the assistant core consumes from collaborators.
//!
//! Every external dependency of the session loop (input capture, speech
//! output, knowledge search, URL opening, general question answering, jokes)
//! is reached through one of these traits so each can be replaced with a
//! stub in tests.

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a single input-capture attempt.
///
/// The sentinel variants mirror the failure modes of a real microphone
/// pipeline and are recovered locally by the session loop, never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A complete user utterance was captured.
    Heard(String),
    /// Nothing was said within the capture timeout. Retried silently.
    Timeout,
    /// Audio was captured but could not be understood.
    Unrecognized,
    /// The capture pipeline failed transiently.
    CaptureError,
    /// No input device is available at all. Ends the session.
    NoInputDevice,
}

/// Source of user input (voice or text).
#[async_trait]
pub trait InputSource: Send {
    /// Wait for the next input event.
    async fn capture(&mut self) -> CaptureOutcome;
}

/// Best-effort speech output. Implementations must never fail the turn;
/// an unavailable backend degrades to a no-op.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str);
}

/// Errors from the knowledge-search provider.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("no article found for \"{0}\"")]
    NotFound(String),
    #[error("\"{0}\" matched multiple articles")]
    Ambiguous(String),
    #[error("search provider error: {0}")]
    Provider(String),
}

/// Topic lookup against an encyclopedic source.
#[async_trait]
pub trait KnowledgeProvider: Send + Sync {
    /// Return a short summary for `topic`.
    async fn search(&self, topic: &str) -> Result<String, SearchError>;
}

/// Errors from opening an external resource.
#[derive(Debug, Clone, Error)]
pub enum OpenError {
    #[error("unsupported resource: {0}")]
    Unsupported(String),
    #[error("failed to launch opener: {0}")]
    Launch(String),
}

/// Opens a URL (or similar identifier) in an external application.
pub trait ResourceOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), OpenError>;
}

/// Errors from the general question-answering provider.
#[derive(Debug, Clone, Error)]
pub enum AskError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("provider returned an empty response")]
    EmptyResponse,
}

/// General-purpose question answering (the fallback intent).
/// Takes `&mut self` so implementations can keep conversation history.
#[async_trait]
pub trait GeneralProvider: Send + Sync {
    async fn ask(&mut self, question: &str) -> Result<String, AskError>;
}

/// Error from the joke source. The responder supplies a hardcoded fallback.
#[derive(Debug, Clone, Error)]
#[error("joke provider error: {0}")]
pub struct JokeError(pub String);

/// Source of jokes.
#[async_trait]
pub trait JokeProvider: Send + Sync {
    async fn joke(&self) -> Result<String, JokeError>;
}
