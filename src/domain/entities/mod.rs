//! Domain entities - Core business objects

pub mod user;
pub mod message;
pub mod condition;
pub mod route;

pub use user::User;
pub use message::Message;
pub use condition::{Condition, Help, Matcher, ADMINS, EVERYONE};
pub use route::{Route, SkillKind, DEFAULT_PRIORITY};
