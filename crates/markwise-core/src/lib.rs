//! markwise-core
//!
//! Pure domain types, grading-mode vocabulary, and storage key conventions.
//! No I/O. This is the shared vocabulary of the markwise crates.

pub mod deadline;
pub mod error;
pub mod models;
pub mod store_keys;
