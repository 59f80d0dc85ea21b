//! # listing-scribe
//!
//! Batch jobs that enrich property listings with a local LLM.
//!
//! ## Features
//!
//! - **Ratings and reviews**: a one-decimal rating and a review per property
//! - **Summaries**: a short summary per property
//! - **Rewrites**: a rewritten title and description per listing
//! - **Best effort**: failed or unparsable completions store a fallback value and the
//!   pass goes on; [`interpreter::Interpreted`] records why a fallback was used

pub mod completion;
pub mod config;
pub mod interpreter;
pub mod jobs;
pub mod listing;
pub mod prompts;
pub mod records;
pub mod storage;

pub use completion::{ChatClient, Completion, CompletionSource};
pub use config::Config;
pub use listing::Listing;
pub use records::Rating;
pub use storage::Storage;
