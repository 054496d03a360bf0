//! Domain layer - Core routing types with no knowledge of concrete backends
//!
//! This layer contains:
//! - Entities: User, Message, Condition, Route
//! - Traits: Abstractions for infrastructure (Sense, Store, CacheBackend, Membership)

pub mod entities;
pub mod traits;
