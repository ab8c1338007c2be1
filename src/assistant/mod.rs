//! Assistant core: intent classification, responders, session loop, and
//! conversation history.
//!
//! Everything outside this module (audio, HTTP providers, the CLI) is an
//! external collaborator reached through the traits in [`capabilities`].

pub mod capabilities;
mod history;
mod intent;
mod responder;
mod session;

pub use capabilities::{CaptureOutcome, GeneralProvider, InputSource, JokeProvider, KnowledgeProvider, ResourceOpener, SpeechOutput};
pub use history::HistoryStore;
pub use intent::{Intent, classify, normalize};
pub use responder::{Action, Reply, Responders};
pub use session::{Session, SessionEvent, SessionState};

use time::OffsetDateTime;

/// Current local time, falling back to UTC when the local offset cannot be
/// determined (e.g. in multi-threaded contexts on some platforms).
pub(crate) fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
