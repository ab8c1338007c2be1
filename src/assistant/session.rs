//! The session loop: capture, classify, respond, persist, repeat.
//!
//! Runs as a background task and reports back to the presentation adapter
//! through a bounded channel of [`SessionEvent`]s, so display concerns stay
//! out of the state machine. One session processes at most one turn at a
//! time; a new capture is not requested until the previous turn's responder
//! and history append have completed.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::capabilities::{CaptureOutcome, InputSource, SpeechOutput};
use super::history::HistoryStore;
use super::intent::{classify, normalize};
use super::responder::{Action, Reply, Responders};

/// Events emitted by the session loop for the presentation adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    UtteranceReceived { text: String },
    ReplyReady { text: String },
    SessionEnded,
}

/// State owned exclusively by the session loop and returned when it stops.
#[derive(Debug, Default)]
pub struct SessionState {
    pub listening: bool,
    pub last_reply: Option<Reply>,
}

const UNRECOGNIZED_REPLY: &str = "Sorry, I didn't understand that. Could you please repeat?";
const CAPTURE_TROUBLE_REPLY: &str = "Sorry, I'm having trouble hearing you. Please try again.";
const NO_INPUT_DEVICE_REPLY: &str = "Microphone not available. Please use text input.";
const EMPTY_INPUT_REPLY: &str = "Please enter a message.";

/// One assistant session: an input source, a speech output, the responders,
/// and the history store, driven either continuously or one turn at a time.
pub struct Session {
    input: Box<dyn InputSource>,
    speech: Box<dyn SpeechOutput>,
    responders: Responders,
    history: HistoryStore,
    events: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
    state: SessionState,
}

impl Session {
    pub fn new(
        input: Box<dyn InputSource>,
        speech: Box<dyn SpeechOutput>,
        responders: Responders,
        history: HistoryStore,
        events: mpsc::Sender<SessionEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self { input, speech, responders, history, events, cancel, state: SessionState::default() }
    }

    /// Run the continuous capture loop until an exit reply, a fatal capture
    /// outcome, or cancellation. Returns the final session state.
    pub async fn run(mut self) -> SessionState {
        self.state.listening = true;

        let greeting = self.responders.initial_greeting();
        self.deliver(greeting).await;

        while self.state.listening {
            // The stop signal must be observed before the next capture
            // attempt, hence the biased select.
            let cancel = self.cancel.clone();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Session cancelled");
                    self.state.listening = false;
                    break;
                }
                outcome = self.input.capture() => outcome,
            };

            match outcome {
                CaptureOutcome::Heard(raw) => {
                    let reply = self.process_turn(&raw).await;
                    let action = reply.action;
                    self.deliver(reply).await;
                    if action == Action::Exit {
                        self.state.listening = false;
                    }
                }
                CaptureOutcome::Timeout => continue,
                CaptureOutcome::Unrecognized => self.deliver(Reply::say(UNRECOGNIZED_REPLY)).await,
                CaptureOutcome::CaptureError => self.deliver(Reply::say(CAPTURE_TROUBLE_REPLY)).await,
                CaptureOutcome::NoInputDevice => {
                    self.deliver(Reply::say(NO_INPUT_DEVICE_REPLY)).await;
                    self.state.listening = false;
                }
            }
        }

        let _ = self.events.send(SessionEvent::SessionEnded).await;
        self.state
    }

    /// Process one typed input and return the reply to the caller.
    /// Single-shot: the session does not keep listening afterwards.
    pub async fn process_text(&mut self, text: &str) -> Reply {
        if text.trim().is_empty() {
            return Reply::say(EMPTY_INPUT_REPLY);
        }
        self.process_turn(text).await
    }

    /// One Processing step: normalize, persist the user line, classify,
    /// respond, persist the assistant line.
    async fn process_turn(&mut self, raw: &str) -> Reply {
        let utterance = normalize(raw);

        let _ = self.events.send(SessionEvent::UtteranceReceived { text: utterance.clone() }).await;
        self.history.append("User", &utterance);

        let intent = classify(&utterance);
        debug!("Classified \"{}\" as {:?}", utterance, intent);

        let reply = self.responders.respond(intent, &utterance).await;
        self.history.append(self.responders.app_name(), &reply.text);

        reply
    }

    /// Emit a reply event and speak it, recording it as the last reply.
    async fn deliver(&mut self, reply: Reply) {
        let _ = self.events.send(SessionEvent::ReplyReady { text: reply.text.clone() }).await;
        self.speech.speak(&reply.text).await;
        self.state.last_reply = Some(reply);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::assistant::capabilities::{AskError, GeneralProvider, JokeError, JokeProvider, KnowledgeProvider, OpenError, ResourceOpener, SearchError};

    struct ScriptedSource {
        outcomes: VecDeque<CaptureOutcome>,
        captures: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl InputSource for ScriptedSource {
        async fn capture(&mut self) -> CaptureOutcome {
            self.captures.fetch_add(1, Ordering::SeqCst);
            self.outcomes.pop_front().unwrap_or(CaptureOutcome::NoInputDevice)
        }
    }

    struct SilentSpeaker;

    #[async_trait]
    impl SpeechOutput for SilentSpeaker {
        async fn speak(&self, _text: &str) {}
    }

    struct StubSearch;

    #[async_trait]
    impl KnowledgeProvider for StubSearch {
        async fn search(&self, _topic: &str) -> Result<String, SearchError> {
            Ok("a summary".into())
        }
    }

    struct StubGeneral;

    #[async_trait]
    impl GeneralProvider for StubGeneral {
        async fn ask(&mut self, _question: &str) -> Result<String, AskError> {
            Ok("an answer".into())
        }
    }

    struct StubJokes;

    #[async_trait]
    impl JokeProvider for StubJokes {
        async fn joke(&self) -> Result<String, JokeError> {
            Ok("a joke".into())
        }
    }

    struct StubOpener;

    impl ResourceOpener for StubOpener {
        fn open(&self, _url: &str) -> Result<(), OpenError> {
            Ok(())
        }
    }

    struct Fixture {
        session: Session,
        events: mpsc::Receiver<SessionEvent>,
        history: HistoryStore,
        captures: Arc<AtomicUsize>,
        cancel: CancellationToken,
        _dir: tempfile::TempDir,
    }

    fn fixture(outcomes: Vec<CaptureOutcome>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let captures = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(64);

        let responders = Responders::new("KiddoBot", Box::new(StubSearch), Box::new(StubOpener), Box::new(StubGeneral), Box::new(StubJokes));
        let session = Session::new(
            Box::new(ScriptedSource { outcomes: outcomes.into(), captures: captures.clone() }),
            Box::new(SilentSpeaker),
            responders,
            HistoryStore::new(&path, 10),
            tx,
            cancel.clone(),
        );

        Fixture { session, events: rx, history: HistoryStore::new(&path, 10), captures, cancel, _dir: dir }
    }

    fn drain(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_exit_utterance_stops_loop() {
        let mut f = fixture(vec![CaptureOutcome::Heard("bye".into())]);
        let state = f.session.run().await;

        assert!(!state.listening);
        assert_eq!(state.last_reply.unwrap().text, "Goodbye! It was nice talking to you!");

        // Exactly one user entry and one assistant entry for the turn.
        let entries = f.history.load_all();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("User: bye"));
        assert!(entries[1].ends_with("KiddoBot: Goodbye! It was nice talking to you!"));

        let events = drain(&mut f.events);
        assert_eq!(events.last(), Some(&SessionEvent::SessionEnded));
        assert_eq!(f.captures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_time_query_turn() {
        let mut f = fixture(vec![CaptureOutcome::Heard("what time is it".into()), CaptureOutcome::Heard("bye".into())]);
        f.session.run().await;

        let events = drain(&mut f.events);
        let time_reply = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::ReplyReady { text } if text.starts_with("It's ") => Some(text.clone()),
                _ => None,
            })
            .expect("no time reply emitted");
        assert!(time_reply.contains("AM") || time_reply.contains("PM"));
    }

    #[tokio::test]
    async fn test_timeouts_are_silent_retries() {
        let mut f = fixture(vec![
            CaptureOutcome::Timeout,
            CaptureOutcome::Timeout,
            CaptureOutcome::Timeout,
            CaptureOutcome::Heard("bye".into()),
        ]);
        f.session.run().await;

        let events = drain(&mut f.events);
        // Initial greeting, one utterance, one farewell, session end. Nothing
        // emitted for the three timeouts.
        assert_eq!(events.len(), 4);
        assert_eq!(f.history.load_all().len(), 2);
        assert_eq!(f.captures.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_unrecognized_gets_apology_and_retries() {
        let mut f = fixture(vec![CaptureOutcome::Unrecognized, CaptureOutcome::Heard("bye".into())]);
        f.session.run().await;

        let events = drain(&mut f.events);
        assert!(events.contains(&SessionEvent::ReplyReady { text: UNRECOGNIZED_REPLY.into() }));
        // Apologies are not persisted; only the real turn is.
        assert_eq!(f.history.load_all().len(), 2);
    }

    #[tokio::test]
    async fn test_capture_error_gets_apology_and_retries() {
        let mut f = fixture(vec![CaptureOutcome::CaptureError, CaptureOutcome::Heard("bye".into())]);
        f.session.run().await;

        let events = drain(&mut f.events);
        assert!(events.contains(&SessionEvent::ReplyReady { text: CAPTURE_TROUBLE_REPLY.into() }));
    }

    #[tokio::test]
    async fn test_no_input_device_ends_session_with_one_notice() {
        let mut f = fixture(vec![CaptureOutcome::NoInputDevice]);
        let state = f.session.run().await;

        assert!(!state.listening);
        // No further capture after the fatal outcome.
        assert_eq!(f.captures.load(Ordering::SeqCst), 1);

        let events = drain(&mut f.events);
        let notices = events.iter().filter(|e| matches!(e, SessionEvent::ReplyReady { text } if text == NO_INPUT_DEVICE_REPLY)).count();
        assert_eq!(notices, 1);
        assert!(f.history.load_all().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_next_capture() {
        let mut f = fixture(vec![CaptureOutcome::Heard("hello".into())]);
        f.cancel.cancel();
        let state = f.session.run().await;

        assert!(!state.listening);
        assert_eq!(f.captures.load(Ordering::SeqCst), 0);

        let events = drain(&mut f.events);
        // Initial greeting, then the session ends with no closing reply.
        assert_eq!(events.len(), 2);
        assert_eq!(events.last(), Some(&SessionEvent::SessionEnded));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::UtteranceReceived { .. })));
    }

    #[tokio::test]
    async fn test_single_shot_text_turn() {
        let mut f = fixture(vec![]);
        let reply = f.session.process_text("what time is it").await;

        assert_eq!(reply.action, Action::Continue);
        assert!(reply.text.starts_with("It's "));
        assert_eq!(f.history.load_all().len(), 2);
    }

    #[tokio::test]
    async fn test_single_shot_empty_input() {
        let mut f = fixture(vec![]);
        let reply = f.session.process_text("   ").await;

        assert_eq!(reply.text, EMPTY_INPUT_REPLY);
        assert!(f.history.load_all().is_empty());
    }

    #[tokio::test]
    async fn test_input_is_normalized_before_classification() {
        let mut f = fixture(vec![]);
        let reply = f.session.process_text("  GOODBYE  ").await;

        assert_eq!(reply.action, Action::Exit);
        let entries = f.history.load_all();
        assert!(entries[0].ends_with("User: goodbye"));
    }
}
