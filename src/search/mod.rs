//! Knowledge search module.
//!
//! Provides topic lookup against the Wikipedia REST API.

mod wikipedia;

pub use wikipedia::WikipediaClient;
