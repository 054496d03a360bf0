//! Message routing - route resolution and permission checks

pub mod permissions;
pub mod registry;

pub use permissions::Permissions;
pub use registry::{HelpEntry, Registry, DEFAULT_SKILL};
