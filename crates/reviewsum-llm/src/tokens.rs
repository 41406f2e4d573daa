//! Token counting used to size the prompt context.

use tiktoken_rs::CoreBPE;

use crate::error::TokenizerError;

/// Counts model tokens for a piece of text.
///
/// Implementations must be deterministic: identical input always yields the
/// same count.
pub trait TokenEstimator {
    fn count_tokens(&self, text: &str) -> usize;
}

impl<T: TokenEstimator + ?Sized> TokenEstimator for &T {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }
}

/// BPE token counter backed by `tiktoken-rs`.
pub struct TiktokenEstimator {
    bpe: CoreBPE,
}

impl TiktokenEstimator {
    /// Load the encoding used by `model`.
    ///
    /// Model names `tiktoken-rs` does not recognise fall back to
    /// `cl100k_base`, the gpt-3.5-turbo / gpt-4 encoding.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError`] if no encoding can be loaded.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                tracing::warn!(model, error = %e, "unknown model for tokenizer; using cl100k_base");
                tiktoken_rs::cl100k_base().map_err(|e| TokenizerError {
                    model: model.to_string(),
                    reason: e.to_string(),
                })?
            }
        };
        Ok(Self { bpe })
    }

    /// The `cl100k_base` encoding.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError`] if the encoding cannot be loaded.
    pub fn cl100k() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| TokenizerError {
            model: "cl100k_base".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { bpe })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
