//! Senses - messaging platform adapters

pub mod console;
pub mod memory;

pub use console::ConsoleSense;
pub use memory::{MemorySense, Outbound};
