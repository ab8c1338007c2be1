//! Opens URLs in the default browser with scheme validation.

use std::process::{Command, Stdio};

use tracing::info;

use crate::assistant::ResourceOpener;
use crate::assistant::capabilities::OpenError;

/// Opens http/https URLs via the platform launcher. All other schemes
/// (`javascript:`, `file://`, `data:`, ...) are rejected.
pub struct BrowserOpener;

impl ResourceOpener for BrowserOpener {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(OpenError::Unsupported(url.to_string()));
        }

        launcher(url).stdout(Stdio::null()).stderr(Stdio::null()).spawn().map_err(|e| OpenError::Launch(e.to_string()))?;

        info!("🌐 Opened {}", url);
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn launcher(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(target_os = "windows")]
fn launcher(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn launcher(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_javascript_scheme() {
        let err = BrowserOpener.open("javascript:alert(1)").unwrap_err();
        assert!(matches!(err, OpenError::Unsupported(_)));
    }

    #[test]
    fn test_rejects_file_scheme() {
        let err = BrowserOpener.open("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, OpenError::Unsupported(_)));
    }

    #[test]
    fn test_rejects_empty_url() {
        assert!(BrowserOpener.open("").is_err());
    }
}
