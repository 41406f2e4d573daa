//! Prompt construction for academy review summaries.

use rust_decimal::Decimal;

use crate::tokens::TokenEstimator;

/// Total tokens the model accepts across prompt and completion.
pub const MODEL_CONTEXT_LIMIT: usize = 16_000;

/// Upper bound on generated tokens per summary.
pub const MAX_COMPLETION_TOKENS: usize = 1_200;

pub const SYSTEM_PROMPT: &str = "Generate a detailed long summary of the Google reviews for a sports academy, ensuring the summary contains at least 350 words and does not exceed 500 words. Do not generate short summaries. Format the summary with bullet points. Start immediately with the summary, maintaining a professional tone and focusing on factual content from the reviews. This is for marketing purposes,so write summary as if you are promoting the sports academy. Include SEO-optimized keywords relevant to sports academies to boost search rankings. Make sure to include proper punctuation, especially full stops at the end of each sentence. Never generate less than 350 words.";

/// Tokens left for review context once the completion and the system prompt
/// are reserved.
#[must_use]
pub fn token_budget<T: TokenEstimator>(estimator: &T) -> usize {
    MODEL_CONTEXT_LIMIT
        .saturating_sub(MAX_COMPLETION_TOKENS)
        .saturating_sub(estimator.count_tokens(SYSTEM_PROMPT))
}

/// Reviews packed into the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewContext {
    /// Accepted reviews, each followed by a newline.
    pub text: String,
    /// Number of reviews accepted from the front of the input.
    pub included: usize,
    /// Sum of the token counts of the accepted reviews.
    pub tokens_used: usize,
}

/// Greedily pack reviews, in order, into at most `budget` tokens.
///
/// Packing stops at the first review that does not fit in what is left of
/// the budget; later reviews are never considered, even if they are shorter.
#[must_use]
pub fn build_context<T, S>(reviews: &[S], estimator: &T, budget: usize) -> ReviewContext
where
    T: TokenEstimator,
    S: AsRef<str>,
{
    let mut context = ReviewContext::default();
    let mut remaining = budget;

    for review in reviews {
        let review = review.as_ref();
        let tokens = estimator.count_tokens(review);
        if tokens > remaining {
            break;
        }
        remaining -= tokens;
        context.text.push_str(review);
        context.text.push('\n');
        context.included += 1;
        context.tokens_used += tokens;
    }

    context
}

/// The user turn: aggregate statistics followed by the review context.
#[must_use]
pub fn user_prompt(total_count: usize, average_rating: Decimal, context: &str) -> String {
    format!(
        "Reviews:\nTotal Rating:{total_count}\nAverage rating:{average_rating}\n{context}\n\nSummary:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One token per whitespace-separated word.
    struct WordCount;

    impl TokenEstimator for WordCount {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    #[test]
    fn budget_reserves_completion_and_system_prompt() {
        let system_words = SYSTEM_PROMPT.split_whitespace().count();
        assert_eq!(
            token_budget(&WordCount),
            MODEL_CONTEXT_LIMIT - MAX_COMPLETION_TOKENS - system_words
        );
    }

    #[test]
    fn packs_everything_that_fits() {
        let reviews = ["one two", "three", "four five six"];
        let context = build_context(&reviews, &WordCount, 100);
        assert_eq!(context.text, "one two\nthree\nfour five six\n");
        assert_eq!(context.included, 3);
        assert_eq!(context.tokens_used, 6);
    }

    #[test]
    fn stops_at_first_review_that_does_not_fit() {
        // 2 + 3 = 5 fits; the 4-token review overflows; the trailing 1-token
        // review would fit but is never reached.
        let reviews = ["a b", "c d e", "f g h i", "j"];
        let context = build_context(&reviews, &WordCount, 8);
        assert_eq!(context.text, "a b\nc d e\n");
        assert_eq!(context.included, 2);
        assert_eq!(context.tokens_used, 5);
    }

    #[test]
    fn never_exceeds_budget() {
        let reviews: Vec<String> = (1..=40).map(|n| "w ".repeat(n)).collect();
        for budget in [0, 1, 7, 50, 333] {
            let context = build_context(&reviews, &WordCount, budget);
            assert!(
                context.tokens_used <= budget,
                "used {} of {budget}",
                context.tokens_used
            );
        }
    }

    #[test]
    fn first_review_over_budget_yields_empty_context() {
        let reviews = ["far too long for the budget", "ok"];
        let context = build_context(&reviews, &WordCount, 3);
        assert_eq!(context, ReviewContext::default());
    }

    #[test]
    fn user_prompt_layout() {
        let prompt = user_prompt(4, Decimal::new(425, 2), "Great coaches!\nFriendly staff\n");
        assert_eq!(
            prompt,
            "Reviews:\nTotal Rating:4\nAverage rating:4.25\nGreat coaches!\nFriendly staff\n\n\nSummary:"
        );
    }
}
