//! Speech output implementations.
//!
//! Speech is best-effort: a missing or failing TTS backend degrades to a
//! silent no-op and never fails a turn.

mod speaker;

pub use speaker::{CommandSpeaker, NullSpeaker, format_for_speech};
