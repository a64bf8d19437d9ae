//! markwise-auth
//!
//! Teacher accounts: registration and password login, backed by storage.

pub mod error;
pub mod identity;
pub mod password;

pub use argon2::Params;
pub use error::AuthError;
pub use identity::IdentityStore;
