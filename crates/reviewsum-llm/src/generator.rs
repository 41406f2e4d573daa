//! Summary generation: prompt assembly plus one completion call.

use rust_decimal::Decimal;

use crate::client::CompletionClient;
use crate::error::GenerationError;
use crate::prompt::{
    build_context, token_budget, user_prompt, MAX_COMPLETION_TOKENS, SYSTEM_PROMPT,
};
use crate::tokens::TokenEstimator;
use crate::types::{ChatMessage, ChatRequest};

/// Builds bounded prompts from cleaned reviews and asks the completion
/// client for a summary.
///
/// The client and estimator are created once at startup and injected here.
pub struct SummaryGenerator<C, T> {
    client: C,
    estimator: T,
    model: String,
}

impl<C, T> SummaryGenerator<C, T>
where
    C: CompletionClient,
    T: TokenEstimator,
{
    #[must_use]
    pub fn new(client: C, estimator: T, model: impl Into<String>) -> Self {
        Self {
            client,
            estimator,
            model: model.into(),
        }
    }

    /// Assemble the chat request for one entity without sending it.
    ///
    /// Reviews are packed in the given order until one no longer fits the
    /// remaining token budget.
    #[must_use]
    pub fn build_request(
        &self,
        reviews: &[String],
        total_count: usize,
        average_rating: Decimal,
    ) -> ChatRequest {
        let budget = token_budget(&self.estimator);
        let context = build_context(reviews, &self.estimator, budget);

        if context.included < reviews.len() {
            tracing::debug!(
                included = context.included,
                total = reviews.len(),
                budget,
                "review context truncated at token budget"
            );
        }

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(user_prompt(total_count, average_rating, &context.text)),
            ],
            temperature: 0.0,
            max_tokens: u32::try_from(MAX_COMPLETION_TOKENS).unwrap_or(u32::MAX),
            top_p: 1.0,
            n: 1,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }

    /// Generate the marketing summary for one entity.
    ///
    /// The completion text is returned verbatim. No retry is attempted here.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if the completion call fails.
    pub async fn generate(
        &self,
        reviews: &[String],
        total_count: usize,
        average_rating: Decimal,
    ) -> Result<String, GenerationError> {
        let request = self.build_request(reviews, total_count, average_rating);
        self.client.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::prompt::MODEL_CONTEXT_LIMIT;
    use crate::types::Role;

    /// Records every request and answers with a fixed summary.
    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl CompletionClient for RecordingClient {
        async fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok("- Expert coaching staff.".to_string())
        }
    }

    struct FailingClient;

    impl CompletionClient for FailingClient {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, GenerationError> {
            Err(GenerationError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            })
        }
    }

    /// Counts characters, which keeps budget arithmetic easy to reason about.
    struct CharCount;

    impl TokenEstimator for CharCount {
        fn count_tokens(&self, text: &str) -> usize {
            text.chars().count()
        }
    }

    fn reviews(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn request_uses_deterministic_sampling_parameters() {
        let generator = SummaryGenerator::new(RecordingClient::default(), CharCount, "gpt-test");
        let request = generator.build_request(&reviews(&["Nice"]), 1, Decimal::from(5));

        assert_eq!(request.model, "gpt-test");
        assert!(request.temperature.abs() < f32::EPSILON);
        assert!((request.top_p - 1.0).abs() < f32::EPSILON);
        assert_eq!(request.n, 1);
        assert_eq!(request.max_tokens, 1200);
        assert!(request.presence_penalty.abs() < f32::EPSILON);
        assert!(request.frequency_penalty.abs() < f32::EPSILON);
    }

    #[test]
    fn request_has_system_then_user_message() {
        let generator = SummaryGenerator::new(RecordingClient::default(), CharCount, "gpt-test");
        let request = generator.build_request(
            &reviews(&["Great coaches!", "Friendly staff"]),
            4,
            Decimal::new(425, 2),
        );

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(
            request.messages[1].content,
            "Reviews:\nTotal Rating:4\nAverage rating:4.25\nGreat coaches!\nFriendly staff\n\n\nSummary:"
        );
    }

    #[test]
    fn oversized_review_ends_the_context() {
        let budget = MODEL_CONTEXT_LIMIT - MAX_COMPLETION_TOKENS - SYSTEM_PROMPT.chars().count();
        let huge = "x".repeat(budget + 1);
        let generator = SummaryGenerator::new(RecordingClient::default(), CharCount, "gpt-test");

        let request = generator.build_request(
            &reviews(&["first", &huge, "after"]),
            3,
            Decimal::from(4),
        );

        let user = &request.messages[1].content;
        assert!(user.contains("first\n"));
        assert!(!user.contains("after"));
        assert!(!user.contains(&huge));
    }

    #[tokio::test]
    async fn generate_returns_completion_text_verbatim() {
        let generator = SummaryGenerator::new(RecordingClient::default(), CharCount, "gpt-test");
        let summary = generator
            .generate(&reviews(&["Great coaches!"]), 1, Decimal::from(5))
            .await
            .unwrap();

        assert_eq!(summary, "- Expert coaching staff.");
        assert_eq!(generator.client.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generate_propagates_client_errors() {
        let generator = SummaryGenerator::new(FailingClient, CharCount, "gpt-test");
        let err = generator
            .generate(&reviews(&["Great coaches!"]), 1, Decimal::from(5))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Api { status: 401, .. }));
    }
}
