//! Summary generation for academy reviews.
//!
//! Packs cleaned reviews into a token-bounded prompt, sends it to an
//! OpenAI-compatible chat-completion endpoint, and returns the generated
//! marketing summary.

pub mod client;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod retry;
pub mod tokens;
pub mod types;

pub use client::{CompletionClient, OpenAiClient};
pub use error::{GenerationError, TokenizerError};
pub use generator::SummaryGenerator;
pub use retry::{is_retriable, retry_with_backoff};
pub use tokens::{TiktokenEstimator, TokenEstimator};
pub use types::{ChatMessage, ChatRequest, Role};
