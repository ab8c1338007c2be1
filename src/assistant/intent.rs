//! Keyword-based intent classification.

/// The classified purpose of one user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Exit,
    Greeting,
    TimeQuery,
    KnowledgeQuery,
    Joke,
    OpenSite,
    Fallback,
}

/// Ordered classification rules. Multiple rules may match an utterance;
/// the first matching rule wins, so the order here is a design contract
/// (e.g. "what time should I quit" is Exit, not TimeQuery).
const RULES: &[(Intent, &[&str])] = &[
    (Intent::Exit, &["stop", "quit", "bye", "goodbye", "exit"]),
    (Intent::Greeting, &["hello", "hi", "hey"]),
    (Intent::TimeQuery, &["time", "date", "today"]),
    (Intent::KnowledgeQuery, &["tell me about", "search for", "what is", "who is", "wikipedia"]),
    (Intent::Joke, &["joke", "funny", "laugh"]),
    (Intent::OpenSite, &["open", "youtube", "google", "http"]),
];

/// Normalize raw input into an utterance: trimmed and lower-cased.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Classify an utterance into an intent.
///
/// Total and deterministic: every string yields exactly one intent,
/// `Fallback` when no rule matches. Patterns are tested as case-insensitive
/// substring containment.
pub fn classify(utterance: &str) -> Intent {
    let utterance = utterance.to_lowercase();

    for (intent, patterns) in RULES {
        if patterns.iter().any(|pattern| utterance.contains(pattern)) {
            return *intent;
        }
    }

    Intent::Fallback
}
