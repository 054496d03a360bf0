//! Application services - Business logic orchestration

pub mod groups;

pub use groups::{Group, GroupDirectory, GROUP_PREFIX};
