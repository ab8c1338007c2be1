//! Joke source module.

mod client;

pub use client::DadJokeClient;
