use std::collections::HashMap;
use std::fmt;

use super::condition::{Condition, Help};
use super::{Message, User};
use crate::application::errors::ValidationError;
use crate::domain::traits::Membership;

pub const MIN_PRIORITY: i64 = 0;
pub const MAX_PRIORITY: i64 = 99;
pub const DEFAULT_PRIORITY: i64 = 10;

/// Name of a registered skill. Only the skill catalog hands these out, so a
/// route can never point at a skill that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkillKind(String);

impl SkillKind {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connects a condition to the skill that handles it
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    destination: SkillKind,
    condition: Condition,
    priority: u8,
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        destination: SkillKind,
        condition: Condition,
        priority: i64,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyRouteName);
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(ValidationError::PriorityOutOfRange(priority));
        }
        if destination.as_str().is_empty() {
            return Err(ValidationError::UnknownSkill(String::new()));
        }

        Ok(Self {
            name,
            destination,
            condition,
            priority: priority as u8,
        })
    }

    /// Built-in fallback routes; their fixed inputs need no validation
    pub(crate) fn sentinel(name: &str, destination: SkillKind, condition: Condition, priority: u8) -> Self {
        Self {
            name: name.to_string(),
            destination,
            condition,
            priority,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination(&self) -> &SkillKind {
        &self.destination
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn action(&self) -> &str {
        self.condition.action()
    }

    pub fn help(&self) -> Option<&Help> {
        self.condition.help()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.condition.matches(text)
    }

    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.condition.tokens(text)
    }

    pub fn named_tokens(&self, text: &str) -> HashMap<String, String> {
        self.condition.named_tokens(text)
    }

    pub async fn permits(&self, user: &User, membership: &dyn Membership) -> bool {
        self.condition.permits(user, membership).await
    }

    pub fn mention_only(&self) -> bool {
        self.condition.mention_only()
    }

    pub fn properly_mentions(&self, message: &Message) -> bool {
        self.condition.properly_mentions(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition() -> Condition {
        Condition::pattern("^hello$", "hello").unwrap()
    }

    #[test]
    fn test_accepts_priority_bounds() {
        for priority in [0, 10, 99] {
            let route = Route::new("fun#hello", SkillKind::new("fun"), condition(), priority).unwrap();
            assert_eq!(route.priority() as i64, priority);
        }
    }

    #[test]
    fn test_rejects_priority_out_of_range() {
        for priority in [-1, 100, 1000] {
            let err = Route::new("fun#hello", SkillKind::new("fun"), condition(), priority).unwrap_err();
            assert_eq!(err, ValidationError::PriorityOutOfRange(priority));
        }
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = Route::new("  ", SkillKind::new("fun"), condition(), 10).unwrap_err();
        assert_eq!(err, ValidationError::EmptyRouteName);
    }

    #[test]
    fn test_delegates_to_condition() {
        let route = Route::new("fun#hello", SkillKind::new("fun"), condition(), 10).unwrap();
        assert_eq!(route.action(), "hello");
        assert!(route.matches("hello"));
        assert!(route.mention_only());
        assert_eq!(route.destination().as_str(), "fun");
    }
}
