//! Application configuration and CLI argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use serde::Deserialize;
use tracing::{info, warn};

/// Assistant application configuration.
///
/// Values are layered: built-in defaults, then the persisted config file,
/// then environment variables and CLI flags. File values only apply to
/// arguments still at their defaults, so env/CLI always win.
#[derive(Parser, Debug, Clone)]
#[command(name = "kiddobot")]
#[command(author, version, about = "A desktop voice-and-text assistant", long_about = None)]
pub struct AppConfig {
    /// Process a single text input, print the reply, and exit
    #[arg(long, value_name = "TEXT")]
    pub once: Option<String>,

    /// Print the saved conversation history and exit
    #[arg(long)]
    pub show_history: bool,

    /// Clear the saved conversation history and exit
    #[arg(long)]
    pub clear_history: bool,

    /// Assistant display name
    #[arg(long, default_value = "KiddoBot")]
    pub app_name: String,

    /// Path to the JSON config file with persisted overrides
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Path to the conversation history file
    #[arg(long, default_value_os_t = default_history_file())]
    pub history_file: PathBuf,

    /// Maximum number of history entries to keep
    #[arg(long, default_value = "5")]
    pub max_history: usize,

    /// Input capture timeout in seconds
    #[arg(long, default_value = "10")]
    pub capture_timeout: u64,

    /// Speech rate in words per minute
    #[arg(long, default_value = "200")]
    pub speech_rate: u32,

    /// Speech volume (0.0 - 1.0)
    #[arg(long, default_value = "0.9", value_parser = parse_volume)]
    pub speech_volume: f32,

    /// Number of sentences in search summaries
    #[arg(long, default_value = "2")]
    pub search_sentences: usize,

    /// Wikipedia base URL
    #[arg(long, default_value = "https://en.wikipedia.org")]
    pub wikipedia_url: String,

    /// Joke API base URL
    #[arg(long, default_value = "https://icanhazdadjoke.com")]
    pub joke_url: String,

    /// Ollama API URL
    #[arg(long, short = 'u', env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Ollama model name
    #[arg(long, short = 'm', env = "OLLAMA_MODEL", default_value = "gemma3:1b")]
    pub ollama_model: String,

    /// System prompt for the fallback LLM
    #[arg(
        long,
        short = 'p',
        default_value = "You are KiddoBot, a friendly and helpful voice assistant. Keep responses concise but informative, suitable for voice output."
    )]
    pub system_prompt: String,

    /// LLM temperature (0.0-2.0)
    #[arg(long, default_value = "0.7", value_parser = parse_temperature)]
    pub temperature: f32,

    /// Maximum LLM conversation history length
    #[arg(long, default_value = "10")]
    pub max_llm_history: usize,

    /// Disable speech output
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Persisted overrides, read from the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    app_name: Option<String>,
    history_file: Option<PathBuf>,
    max_history: Option<usize>,
    capture_timeout: Option<u64>,
    speech_rate: Option<u32>,
    speech_volume: Option<f32>,
    search_sentences: Option<usize>,
    ollama_url: Option<String>,
    ollama_model: Option<String>,
}

impl AppConfig {
    /// Parse configuration from command line arguments, then layer in the
    /// persisted config file underneath env/CLI values.
    pub fn from_args() -> Self {
        let matches = <Self as CommandFactory>::command().get_matches();
        let mut config = match <Self as FromArgMatches>::from_arg_matches(&matches) {
            Ok(config) => config,
            Err(e) => e.exit(),
        };

        let path = config.config_file.clone().unwrap_or_else(default_config_file);
        if let Some(file) = load_config_file(&path) {
            info!("Loaded configuration overrides from {}", path.display());
            config.merge_file(file, &matches);
        }

        config
    }

    /// Apply file values over arguments still at their built-in defaults.
    fn merge_file(&mut self, file: FileConfig, matches: &ArgMatches) {
        let is_default = |id: &str| matches.value_source(id) == Some(ValueSource::DefaultValue);

        if is_default("app_name")
            && let Some(v) = file.app_name
        {
            self.app_name = v;
        }
        if is_default("history_file")
            && let Some(v) = file.history_file
        {
            self.history_file = v;
        }
        if is_default("max_history")
            && let Some(v) = file.max_history
        {
            self.max_history = v;
        }
        if is_default("capture_timeout")
            && let Some(v) = file.capture_timeout
        {
            self.capture_timeout = v;
        }
        if is_default("speech_rate")
            && let Some(v) = file.speech_rate
        {
            self.speech_rate = v;
        }
        if is_default("speech_volume")
            && let Some(v) = file.speech_volume
        {
            self.speech_volume = v;
        }
        if is_default("search_sentences")
            && let Some(v) = file.search_sentences
        {
            self.search_sentences = v;
        }
        if is_default("ollama_url")
            && let Some(v) = file.ollama_url
        {
            self.ollama_url = v;
        }
        if is_default("ollama_model")
            && let Some(v) = file.ollama_model
        {
            self.ollama_model = v;
        }
    }

    /// The capture timeout as a [`Duration`].
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout)
    }

    /// Validate the configuration.
    ///
    /// File overrides bypass the CLI value parsers, so ranges are checked
    /// again here.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.speech_volume) {
            anyhow::bail!("Speech volume must be between 0.0 and 1.0");
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!("Temperature must be between 0.0 and 2.0");
        }

        if self.speech_rate == 0 {
            anyhow::bail!("Speech rate must be positive");
        }

        if self.max_history == 0 {
            anyhow::bail!("Max history must be at least 1");
        }

        if self.search_sentences == 0 {
            anyhow::bail!("Search sentence count must be at least 1");
        }

        if self.capture_timeout == 0 {
            anyhow::bail!("Capture timeout must be at least 1 second");
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  App name: {}", self.app_name);
        info!("  History file: {} (max {} entries)", self.history_file.display(), self.max_history);
        info!("  Capture timeout: {}s", self.capture_timeout);
        info!("  Speech: {} wpm at volume {}{}", self.speech_rate, self.speech_volume, if self.quiet { " (muted)" } else { "" });
        info!("  Search: {} ({} sentences)", self.wikipedia_url, self.search_sentences);
        info!("  Jokes: {}", self.joke_url);
        info!("  Ollama URL: {}", self.ollama_url);
        info!("  Ollama model: {}", self.ollama_model);
        info!("  System prompt: {}...", &self.system_prompt.chars().take(50).collect::<String>());
        info!("  Temperature: {}", self.temperature);
    }
}

/// Load the persisted config file, if any. Parse failures are reported and
/// treated as no overrides.
fn load_config_file(path: &std::path::Path) -> Option<FileConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!("Ignoring malformed config file {}: {}", path.display(), e);
            None
        }
    }
}

/// The default application data directory (~/.kiddobot).
fn default_data_dir() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        home_dir.join(".kiddobot")
    } else {
        PathBuf::from(".")
    }
}

/// The default history file (~/.kiddobot/history.txt).
fn default_history_file() -> PathBuf {
    default_data_dir().join("history.txt")
}

/// The default config file (~/.kiddobot/config.json).
fn default_config_file() -> PathBuf {
    default_data_dir().join("config.json")
}

/// Parse and validate volume value (0.0-1.0).
fn parse_volume(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("volume must be between 0.0 and 1.0, got {}", value))
    }
}

/// Parse and validate temperature value (0.0-2.0).
fn parse_temperature(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if (0.0..=2.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("temperature must be between 0.0 and 2.0, got {}", value))
    }
}
