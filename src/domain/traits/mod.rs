//! Domain traits - Abstractions for infrastructure implementations

pub mod cache;
pub mod membership;
pub mod sense;
pub mod store;

pub use cache::CacheBackend;
pub use membership::Membership;
pub use sense::{Feature, Sense};
pub use store::Store;
