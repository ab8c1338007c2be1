//! Bounded, file-backed conversation history.
//!
//! Each turn is persisted as one `[timestamp] speaker: text` line. The file
//! never holds more than `max_entries` lines; the oldest are evicted first.
//! Persistence failures are reported locally and never abort a turn.

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use time::macros::format_description;
use tracing::warn;

use super::local_now;

/// Append-only, size-bounded conversation log.
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self { path: path.into(), max_entries }
    }

    /// Append one speaker-tagged line, evicting the oldest entries beyond
    /// the cap. I/O failures are logged and swallowed.
    pub fn append(&self, speaker: &str, text: &str) {
        if let Err(e) = self.try_append(speaker, text) {
            warn!("Failed to save conversation history: {:#}", e);
        }
    }

    /// Load all entries in insertion order, newest last.
    /// A missing file is an empty history; read failures load as empty.
    pub fn load_all(&self) -> Vec<String> {
        match self.try_load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to load conversation history: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Remove the history file. Idempotent.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!("Failed to clear conversation history: {}", e);
        }
    }

    fn try_append(&self, speaker: &str, text: &str) -> Result<()> {
        let mut entries = self.try_load()?;
        entries.push(format!("[{}] {}: {}", current_timestamp(), speaker, text));

        // Keep only the most recent entries, strict FIFO eviction.
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut contents = entries.join("\n");
        contents.push('\n');
        fs::write(&self.path, contents).with_context(|| format!("Failed to write {}", self.path.display()))?;

        Ok(())
    }

    fn try_load(&self) -> Result<Vec<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        };

        Ok(contents.lines().filter(|line| !line.trim().is_empty()).map(str::to_string).collect())
    }
}

/// Timestamp in `YYYY-MM-DD HH:MM:SS` form, local time.
fn current_timestamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    local_now().format(format).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir, max: usize) -> HistoryStore {
        HistoryStore::new(dir.path().join("history.txt"), max)
    }

    #[test]
    fn test_append_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let history = store(&dir, 5);

        history.append("User", "hello");
        history.append("KiddoBot", "hi there");

        let entries = history.load_all();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("User: hello"));
        assert!(entries[1].ends_with("KiddoBot: hi there"));
    }

    #[test]
    fn test_never_exceeds_cap_and_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let history = store(&dir, 3);

        for i in 0..7 {
            history.append("User", &format!("message {i}"));
            assert!(history.load_all().len() <= 3);
        }

        let entries = history.load_all();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].ends_with("message 4"));
        assert!(entries[2].ends_with("message 6"));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = store(&dir, 5);
        assert!(history.load_all().is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let history = store(&dir, 5);

        history.append("User", "hello");
        history.clear();
        assert!(history.load_all().is_empty());

        // Second clear on a missing file is a no-op.
        history.clear();
        assert!(history.load_all().is_empty());
    }

    #[test]
    fn test_entries_carry_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let history = store(&dir, 5);

        history.append("User", "hello");
        let entries = history.load_all();
        assert!(entries[0].starts_with('['));
        assert!(entries[0].contains("] User: hello"));
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::new(dir.path().join("nested").join("history.txt"), 5);

        history.append("User", "hello");
        assert_eq!(history.load_all().len(), 1);
    }
}
