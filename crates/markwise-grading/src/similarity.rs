use std::collections::HashMap;

use futures::future::{self, BoxFuture};

use crate::error::GradingError;
use crate::normalize::normalize;

/// Semantic closeness of two strings, in `[0, 1]`.
///
/// Implementations may call out to an embedding model, so the call is async.
/// The engine treats values outside `[0, 1]` as suspect and clamps them.
pub trait Similarity: Send + Sync {
    fn similarity<'a>(&'a self, a: &'a str, b: &'a str) -> BoxFuture<'a, Result<f64, GradingError>>;
}

/// Cosine similarity of bag-of-words term counts over normalized text.
///
/// The built-in fallback when no embedding backend is configured. Word order
/// and synonyms are invisible to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenCosineSimilarity;

impl TokenCosineSimilarity {
    pub fn score(a: &str, b: &str) -> f64 {
        let a = normalize(a);
        let b = normalize(b);
        let ta = term_counts(&a);
        let tb = term_counts(&b);
        if ta.is_empty() || tb.is_empty() {
            return 0.0;
        }

        let dot: f64 = ta
            .iter()
            .filter_map(|(term, ca)| tb.get(term).map(|cb| ca * cb))
            .sum();
        let norm_a = ta.values().map(|c| c * c).sum::<f64>().sqrt();
        let norm_b = tb.values().map(|c| c * c).sum::<f64>().sqrt();

        (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
    }
}

impl Similarity for TokenCosineSimilarity {
    fn similarity<'a>(
        &'a self,
        a: &'a str,
        b: &'a str,
    ) -> BoxFuture<'a, Result<f64, GradingError>> {
        Box::pin(future::ready(Ok(Self::score(a, b))))
    }
}

fn term_counts(text: &str) -> HashMap<&str, f64> {
    let mut counts = HashMap::new();
    for word in text.split_whitespace() {
        *counts.entry(word).or_insert(0.0) += 1.0;
    }
    counts
}
