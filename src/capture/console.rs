//! Console input source reading lines from stdin.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::assistant::{CaptureOutcome, InputSource};

/// Line-oriented input source over stdin with a capture timeout.
pub struct ConsoleSource {
    lines: Lines<BufReader<Stdin>>,
    timeout: Duration,
}

impl ConsoleSource {
    pub fn new(timeout: Duration) -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines(), timeout }
    }
}

#[async_trait]
impl InputSource for ConsoleSource {
    async fn capture(&mut self) -> CaptureOutcome {
        debug!("Listening...");

        match tokio::time::timeout(self.timeout, self.lines.next_line()).await {
            Err(_) => CaptureOutcome::Timeout,
            Ok(Ok(Some(line))) => {
                let line = line.trim();
                if line.is_empty() {
                    CaptureOutcome::Unrecognized
                } else {
                    CaptureOutcome::Heard(line.to_string())
                }
            }
            // Stdin closed: no more input will ever arrive.
            Ok(Ok(None)) => CaptureOutcome::NoInputDevice,
            Ok(Err(e)) => {
                debug!("Input read error: {}", e);
                CaptureOutcome::CaptureError
            }
        }
    }
}
