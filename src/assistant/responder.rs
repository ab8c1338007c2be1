//! Per-intent responders producing user-facing replies.
//!
//! Responders are total: provider failures are converted into apologetic
//! reply text here and never surface as errors to the session loop.

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::warn;

use super::capabilities::{AskError, GeneralProvider, JokeProvider, KnowledgeProvider, ResourceOpener, SearchError};
use super::intent::Intent;
use super::local_now;

/// What the session loop should do after delivering a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Exit,
}

/// One assistant reply: the text to deliver plus the follow-up action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub action: Action,
}

impl Reply {
    /// A reply that keeps the session going.
    pub fn say(text: impl Into<String>) -> Self {
        Self { text: text.into(), action: Action::Continue }
    }

    /// A reply that ends the session.
    pub fn farewell(text: impl Into<String>) -> Self {
        Self { text: text.into(), action: Action::Exit }
    }
}

/// Used when the joke provider is unreachable.
const FALLBACK_JOKE: &str = "Why don't scientists trust atoms? Because they make up everything!";

/// Maps each intent to exactly one reply, delegating to the capability
/// providers for knowledge search, URL opening, jokes, and general questions.
pub struct Responders {
    app_name: String,
    search: Box<dyn KnowledgeProvider>,
    opener: Box<dyn ResourceOpener>,
    general: Box<dyn GeneralProvider>,
    jokes: Box<dyn JokeProvider>,
}

impl Responders {
    pub fn new(
        app_name: impl Into<String>,
        search: Box<dyn KnowledgeProvider>,
        opener: Box<dyn ResourceOpener>,
        general: Box<dyn GeneralProvider>,
        jokes: Box<dyn JokeProvider>,
    ) -> Self {
        Self { app_name: app_name.into(), search, opener, general, jokes }
    }

    /// Produce the reply for a classified utterance. Never fails.
    pub async fn respond(&mut self, intent: Intent, utterance: &str) -> Reply {
        match intent {
            Intent::Exit => Reply::farewell("Goodbye! It was nice talking to you!"),
            Intent::Greeting => Reply::say(self.greeting_text()),
            Intent::TimeQuery => Reply::say(time_reply(local_now())),
            Intent::KnowledgeQuery => self.knowledge(utterance).await,
            Intent::Joke => self.joke().await,
            Intent::OpenSite => self.open_site(utterance),
            Intent::Fallback => self.ask_general(utterance).await,
        }
    }

    /// The assistant's display name, used to tag persisted replies.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// The reply emitted when a session starts, before the first capture.
    pub fn initial_greeting(&self) -> Reply {
        Reply::say(format!("{} How can I help you today?", self.greeting_text()))
    }

    fn greeting_text(&self) -> String {
        format!("Hi! I'm {}, your smart buddy! {}", self.app_name, greeting_for_hour(local_now().hour()))
    }

    async fn knowledge(&self, utterance: &str) -> Reply {
        // Strip the query phrases so only the topic remains.
        let topic = utterance.replace("tell me about", "").replace("search for", "");
        let topic = topic.trim();

        if topic.is_empty() {
            return Reply::say("Please specify what you'd like me to search for.");
        }

        match self.search.search(topic).await {
            Ok(summary) => Reply::say(format!("Here's what I found about {topic}: {summary}")),
            Err(SearchError::NotFound(_)) => Reply::say(format!("Sorry, I couldn't find any information about {topic} on Wikipedia.")),
            Err(SearchError::Ambiguous(_)) => Reply::say(format!("I found multiple results for {topic}. Please be more specific.")),
            Err(SearchError::Provider(e)) => {
                warn!("Search failed: {}", e);
                Reply::say("Sorry, I encountered an error while searching.")
            }
        }
    }

    async fn joke(&self) -> Reply {
        match self.jokes.joke().await {
            Ok(joke) => Reply::say(joke),
            Err(e) => {
                warn!("Joke provider failed: {}", e);
                Reply::say(format!("Sorry, I couldn't fetch a joke right now. Here's one: {FALLBACK_JOKE}"))
            }
        }
    }

    fn open_site(&self, utterance: &str) -> Reply {
        let target = if utterance.contains("youtube") {
            ("https://www.youtube.com".to_string(), "Opening YouTube for you!".to_string())
        } else if utterance.contains("google") {
            ("https://www.google.com".to_string(), "Opening Google for you!".to_string())
        } else if utterance.contains("open") && utterance.contains("http") {
            match extract_url(utterance) {
                Some(url) => {
                    let message = format!("Opening {url} for you!");
                    (url, message)
                }
                None => return Reply::say("Please provide a valid URL starting with http or https."),
            }
        } else {
            return Reply::say("I can open YouTube, Google, or any URL you specify.");
        };

        let (url, message) = target;
        match self.opener.open(&url) {
            Ok(()) => Reply::say(message),
            Err(e) => {
                warn!("Failed to open {}: {}", url, e);
                Reply::say("Sorry, I couldn't open that website.")
            }
        }
    }

    async fn ask_general(&mut self, utterance: &str) -> Reply {
        match self.general.ask(utterance).await {
            Ok(answer) => Reply::say(answer),
            Err(AskError::EmptyResponse) => Reply::say("I received an empty response. Please try asking something else."),
            Err(AskError::Provider(e)) => {
                warn!("General provider failed: {}", e);
                Reply::say("Sorry, I couldn't process your question right now.")
            }
        }
    }
}

/// Pick the greeting phrase for an hour of day.
///
/// Bands: [5,12) morning, [12,17) afternoon, [17,22) evening, night otherwise.
pub fn greeting_for_hour(hour: u8) -> &'static str {
    match hour {
        5..=11 => "Good morning!",
        12..=16 => "Good afternoon!",
        17..=21 => "Good evening!",
        _ => "Good night!",
    }
}

/// Format the current time reply, e.g.
/// "It's 3:05 PM on Sunday, August 23, 2026".
pub fn time_reply(now: OffsetDateTime) -> String {
    let format = format_description!("[hour repr:12 padding:none]:[minute] [period] on [weekday], [month repr:long] [day padding:none], [year]");

    match now.format(format) {
        Ok(formatted) => format!("It's {formatted}"),
        Err(_) => "Sorry, I couldn't read the clock right now.".to_string(),
    }
}

/// First whitespace-separated token that looks like a URL.
fn extract_url(utterance: &str) -> Option<String> {
    utterance.split_whitespace().find(|word| word.starts_with("http")).map(str::to_string)
}
