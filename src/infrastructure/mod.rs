//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Encrypted persistence
//! - Cache: Expiring values
//! - Adapters: Senses (console, in-memory)

pub mod adapters;
pub mod cache;
pub mod config;
pub mod storage;
