//! Best-effort speech synthesis via the platform TTS command.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::assistant::SpeechOutput;

/// Abbreviations and symbols that TTS engines read poorly, replaced in order.
const SPEECH_REPLACEMENTS: &[(&str, &str)] = &[
    ("&", "and"),
    ("@", "at"),
    ("%", "percent"),
    ("$", "dollars"),
    ("#", "number"),
    ("www.", "www dot "),
    (".com", " dot com"),
    (".org", " dot org"),
    (".net", " dot net"),
    ("http://", ""),
    ("https://", ""),
    ("CEO", "C E O"),
    ("USA", "U S A"),
    ("UK", "U K"),
    ("AI", "A I"),
];

/// Rewrite text to be friendlier to speech synthesis.
pub fn format_for_speech(text: &str) -> String {
    let mut formatted = text.to_string();
    for (from, to) in SPEECH_REPLACEMENTS {
        formatted = formatted.replace(from, to);
    }
    formatted
}

/// Speaks through the platform TTS command (`say` on macOS, `espeak`
/// elsewhere). Failures are logged at debug level and otherwise ignored.
pub struct CommandSpeaker {
    rate: u32,
    volume: f32,
}

impl CommandSpeaker {
    /// # Arguments
    /// * `rate` - Speech rate in words per minute
    /// * `volume` - Output volume, 0.0 to 1.0
    pub fn new(rate: u32, volume: f32) -> Self {
        Self { rate, volume }
    }

    #[cfg(target_os = "macos")]
    fn command(&self, text: &str) -> Command {
        let mut cmd = Command::new("say");
        cmd.arg("-r").arg(self.rate.to_string()).arg(text);
        cmd
    }

    #[cfg(not(target_os = "macos"))]
    fn command(&self, text: &str) -> Command {
        // espeak amplitude range is 0-200.
        let amplitude = (self.volume.clamp(0.0, 1.0) * 200.0) as u32;
        let mut cmd = Command::new("espeak");
        cmd.arg("-s").arg(self.rate.to_string()).arg("-a").arg(amplitude.to_string()).arg(text);
        cmd
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeaker {
    async fn speak(&self, text: &str) {
        let text = format_for_speech(text);

        let mut cmd = self.command(&text);
        cmd.stdout(std::process::Stdio::null()).stderr(std::process::Stdio::null());

        match cmd.status().await {
            Ok(status) if status.success() => {}
            Ok(status) => debug!("TTS command exited with {}", status),
            Err(e) => debug!("Speech output unavailable: {}", e),
        }
    }
}

/// Silent speech output for `--quiet` mode and tests.
pub struct NullSpeaker;

#[async_trait]
impl SpeechOutput for NullSpeaker {
    async fn speak(&self, _text: &str) {}
}
