//! markwise-storage
//!
//! Object storage over a local directory. Keys are `/`-separated relative
//! paths; values are opaque bytes, usually JSON. Writes are atomic
//! (temp file + rename) and retried a bounded number of times on transient
//! I/O failure.

pub mod bucket;
pub mod error;
pub mod objects;
pub mod retry;
pub mod state;

pub use bucket::Bucket;
pub use error::StorageError;
pub use retry::RetryPolicy;
