//! Input capture implementations.
//!
//! The console source stands in for a microphone pipeline: it reads stdin
//! lines and maps read failures to the same sentinel outcomes a voice
//! capture would produce.

mod console;

pub use console::ConsoleSource;
