//! Skill system
//!
//! Skills own the actions routes resolve to. The catalog decides which
//! skills exist; the registry only accepts routes pointing at them.

pub mod catalog;
pub mod default;
pub mod diagnostics;
pub mod fun;
pub mod groups;
pub mod help;
pub mod trait_def;

pub use catalog::SkillCatalog;
pub use trait_def::{RouteSpec, Skill, SkillContext, SkillInfo};
