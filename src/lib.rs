//! skillgate - routes chat messages to skills behind group permissions,
//! with encrypted storage for skill state.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod skills;

pub use application::errors::BotError;
pub use application::AppContext;
