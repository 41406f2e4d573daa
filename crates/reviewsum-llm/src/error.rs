use thiserror::Error;

/// Errors returned while producing a summary.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("completion API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the chat-completion shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider returned no choice or a choice without text.
    #[error("completion contained no text")]
    EmptyCompletion,

    #[error("invalid completion base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// The tokenizer for the configured model could not be loaded.
#[derive(Debug, Error)]
#[error("failed to load tokenizer for {model}: {reason}")]
pub struct TokenizerError {
    pub model: String,
    pub reason: String,
}
