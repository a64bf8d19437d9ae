//! markwise-grading
//!
//! The scoring core. Maps (answer, expected answer, max score, mode) to a
//! [`Grade`](markwise_core::models::grade::Grade). Everything here is pure
//! except the similarity lookup, which sits behind the [`Similarity`] trait.

pub mod engine;
pub mod error;
pub mod normalize;
pub mod similarity;

pub use engine::grade;
pub use error::GradingError;
pub use similarity::{Similarity, TokenCosineSimilarity};
