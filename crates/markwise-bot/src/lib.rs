//! markwise-bot
//!
//! The conversation layer. Each inbound `(participant, event)` pair is run
//! through that participant's session state machine, which either advances
//! the stage or dispatches to the classroom and identity services, and the
//! resulting reply is handed back to the channel.

pub mod bot;
pub mod config;
pub mod error;
pub mod event;
mod flows;
pub mod session;

pub use bot::Bot;
pub use config::BotConfig;
pub use error::FlowError;
pub use event::{Button, Event, Reply};
