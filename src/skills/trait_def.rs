//! Skill trait definitions

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::{BotError, StorageError, ValidationError};
use crate::application::AppContext;
use crate::domain::entities::{Condition, Help, Message, Route, User, DEFAULT_PRIORITY, EVERYONE};
use crate::domain::traits::{Feature, Sense};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::config::ConfigEntry;
use crate::infrastructure::storage::Storage;

/// Core trait every skill implements
#[async_trait]
pub trait Skill: Send + Sync {
    /// Namespace of the skill; routes, settings and cache keys live under it
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Routes this skill claims
    fn routes(&self) -> Result<Vec<RouteSpec>, ValidationError> {
        Ok(Vec::new())
    }

    /// Settings this skill reads, relative to `skills.<name>.`
    fn settings(&self) -> Vec<ConfigEntry> {
        Vec::new()
    }

    /// Run the action a route resolved to
    async fn call(&self, ctx: &SkillContext, action: &str) -> Result<(), BotError>;
}

/// A route a skill wants registered
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub name: Option<String>,
    pub condition: Condition,
    pub priority: i64,
}

impl RouteSpec {
    /// Pattern route open to everyone, answered only when addressed
    pub fn pattern(pattern: &str, action: &str) -> Result<Self, ValidationError> {
        Ok(Self::condition(Condition::pattern(pattern, action)?.allow_groups([EVERYONE])))
    }

    pub fn condition(condition: Condition) -> Self {
        Self {
            name: None,
            condition,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_help(mut self, help: impl Into<Help>) -> Self {
        self.condition = self.condition.with_help(help);
        self
    }

    pub fn allow_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition = self.condition.allow_groups(groups);
        self
    }

    /// Fire on ambient chatter instead of direct address
    pub fn ambient(mut self) -> Self {
        self.condition = self.condition.with_mention_only(false);
        self
    }

    /// Route name, `<skill>#<action>` unless set
    pub fn route_name(&self, skill: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}#{}", skill, self.condition.action()))
    }
}

/// Everything a skill action gets to work with
pub struct SkillContext {
    pub sense: Arc<dyn Sense>,
    pub route: Arc<Route>,
    pub message: Message,
    pub request_id: String,
    pub tokens: Vec<String>,
    pub named_tokens: HashMap<String, String>,
    pub app: Arc<AppContext>,
}

impl SkillContext {
    pub fn namespace(&self) -> &str {
        self.route.destination().as_str()
    }

    pub fn author(&self) -> &User {
        &self.message.author
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn named_token(&self, name: &str) -> Option<&str> {
        self.named_tokens.get(name).map(String::as_str)
    }

    pub async fn reply(&self, text: &str) -> Result<(), BotError> {
        self.sense.reply(&self.message, text).await
    }

    pub async fn private_reply(&self, text: &str) -> Result<(), BotError> {
        self.sense.private_reply(&self.message, text).await
    }

    /// React if the sense supports it; returns whether a reaction was sent
    pub async fn react(&self, reaction: &str) -> Result<bool, BotError> {
        if !self.sense.supports(Feature::Reactions) {
            return Ok(false);
        }
        self.sense.react(&self.message, reaction).await?;
        Ok(true)
    }

    pub fn mention(&self, user: &User) -> String {
        self.sense.mention(user)
    }

    pub fn codify(&self, text: &str) -> String {
        self.sense.codify(text)
    }

    /// `@author,` in channels, nothing in private conversations
    pub fn address_prefix(&self) -> String {
        if self.message.private {
            String::new()
        } else {
            format!("{}, ", self.mention(self.author()))
        }
    }

    /// Setting under this skill's namespace
    pub fn config(&self, key: &str) -> Option<String> {
        self.app.settings.get_str(&format!("skills.{}.{}", self.namespace(), key))
    }

    pub fn storage(&self) -> &Storage {
        &self.app.storage
    }

    pub fn cache(&self) -> &Cache {
        &self.app.cache
    }

    pub fn cache_key(&self, key: &str) -> String {
        format!("skills.{}.{}", self.namespace(), key)
    }

    /// Namespaced [`crate::infrastructure::cache::Cache::fetch_or_compute`]
    pub async fn cached<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T, StorageError>
    where
        T: Serialize + serde::de::DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.cache().fetch_or_compute(&self.cache_key(key), ttl, producer).await
    }
}

/// Listing entry for loaded skills
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInfo {
    pub name: String,
    pub description: String,
    pub routes: Vec<String>,
}

/// Pick one of several canned phrasings
pub fn pick<'a>(options: &[&'a str]) -> &'a str {
    options.choose(&mut rand::thread_rng()).copied().unwrap_or("")
}

pub const ACKNOWLEDGEMENTS: &[&str] = &[
    "I'll get back to you in just a sec.",
    "You got it!",
    "As you wish.",
    "Certainly!",
    "Sure thing!",
    "Absolutely!",
    "No problem.",
    "Consider it done.",
    "Of course!",
    "Right away!",
    "I'm on it!",
    "Let me see what I can do.",
    "Will do!",
];

pub fn acknowledgement() -> &'static str {
    pick(ACKNOWLEDGEMENTS)
}
