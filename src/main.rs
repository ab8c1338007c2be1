//! KiddoBot - a desktop voice-and-text assistant.
//!
//! Routes typed or spoken input through a keyword-based command router and
//! replies with text and best-effort speech: time and date, greetings,
//! Wikipedia summaries, jokes, and website opening, with a local LLM
//! (Ollama via RIG) answering everything else.

mod assistant;
mod browser;
mod capture;
mod config;
mod jokes;
mod llm;
mod search;
mod speech;

use anyhow::Result;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use assistant::{HistoryStore, Responders, Session, SessionEvent, SpeechOutput};
use browser::BrowserOpener;
use capture::ConsoleSource;
use config::AppConfig;
use jokes::DadJokeClient;
use llm::LlmClient;
use search::WikipediaClient;
use speech::{CommandSpeaker, NullSpeaker};

/// Spawn the presentation task rendering session events.
///
/// Display concerns stay out of the session loop: the loop emits typed
/// events and this task renders them.
fn spawn_renderer(mut events: mpsc::Receiver<SessionEvent>, app_name: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::UtteranceReceived { text } => info!("🗣️  You: {}", text),
                SessionEvent::ReplyReady { text } => info!("🤖 {}: {}", app_name, text),
                SessionEvent::SessionEnded => {
                    debug!("Session ended");
                    break;
                }
            }
        }
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("Failed to register SIGTERM handler");
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("🛑 Received SIGTERM, shutting down...");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments (layered over the persisted config file)
    let config = AppConfig::from_args();

    // Initialize logging with time-only format.
    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if config.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("info") })
        .unwrap();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("🤖 {} v{}", config.app_name, env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }

    let history = HistoryStore::new(&config.history_file, config.max_history);

    // History inspection modes exit before a session is constructed.
    if config.show_history {
        for entry in history.load_all() {
            println!("{entry}");
        }
        return Ok(());
    }

    if config.clear_history {
        history.clear();
        info!("🗑️  Conversation history cleared");
        return Ok(());
    }

    config.log_config();

    // Construct providers; failure here is fatal (nothing else is).
    let responders = Responders::new(
        config.app_name.clone(),
        Box::new(WikipediaClient::new(&config)?),
        Box::new(BrowserOpener),
        Box::new(LlmClient::new(&config)?),
        Box::new(DadJokeClient::new(&config)?),
    );

    let speech: Box<dyn SpeechOutput> = if config.quiet {
        Box::new(NullSpeaker)
    } else {
        Box::new(CommandSpeaker::new(config.speech_rate, config.speech_volume))
    };

    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(32);
    let cancel = CancellationToken::new();

    let input = Box::new(ConsoleSource::new(config.capture_timeout()));
    let mut session = Session::new(input, speech, responders, history, event_tx, cancel.clone());

    // Single-shot text mode: one turn, reply back to the caller.
    if let Some(ref text) = config.once {
        let _event_rx = event_rx;
        let reply = session.process_text(text).await;
        info!("🤖 {}: {}", config.app_name, reply.text);
        return Ok(());
    }

    info!("Starting {}... (say \"bye\" or press Ctrl+C to stop)", config.app_name);

    let renderer_handle = spawn_renderer(event_rx, config.app_name.clone());
    let mut session_handle = tokio::spawn(session.run());

    tokio::select! {
        _ = wait_for_shutdown() => {
            cancel.cancel();

            // Give the loop a moment to observe the stop signal before
            // forcefully aborting.
            let graceful_timeout = tokio::time::Duration::from_secs(2);
            match tokio::time::timeout(graceful_timeout, &mut session_handle).await {
                Ok(Ok(state)) => debug!("Session stopped gracefully (last reply: {:?})", state.last_reply.map(|r| r.text)),
                Ok(Err(e)) => warn!("Session task failed: {}", e),
                Err(_) => {
                    warn!("Session didn't stop in time, aborting");
                    session_handle.abort();
                }
            }
        }
        result = &mut session_handle => {
            if let Err(e) = result {
                warn!("Session task failed: {}", e);
            }
        }
    }

    let _ = renderer_handle.await;

    info!("✅ {} stopped", config.app_name);
    Ok(())
}
