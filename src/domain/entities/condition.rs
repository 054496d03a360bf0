//! Route conditions - matching, tokenizing and permission policy

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex_lite::Regex;
use serde::Serialize;

use super::{Message, User};
use crate::application::errors::ValidationError;
use crate::domain::traits::Membership;

/// Reserved group that lets anybody through
pub const EVERYONE: &str = "everyone";

/// Managed group whose members pass every permission check
pub const ADMINS: &str = "admins";

/// Help text attached to a condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Help {
    Text(String),
    Usage {
        usage: String,
        description: Option<String>,
    },
}

impl Help {
    pub fn usage(usage: impl Into<String>, description: impl Into<String>) -> Self {
        Help::Usage {
            usage: usage.into(),
            description: Some(description.into()),
        }
    }
}

impl From<&str> for Help {
    fn from(text: &str) -> Self {
        Help::Text(text.to_string())
    }
}

/// Custom text matcher for conditions that are not plain patterns
pub trait Matcher: Send + Sync + fmt::Debug {
    fn matches(&self, text: &str) -> bool;

    fn tokens(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }

    fn named_tokens(&self, _text: &str) -> HashMap<String, String> {
        HashMap::new()
    }
}

#[derive(Debug, Clone)]
enum Mechanism {
    /// Fallback for messages nobody claimed
    Default,
    /// Matched, but the author may not use it
    PermissionDenied,
    /// Silent drop
    BlackHole,
    Pattern(Regex),
    Custom(Arc<dyn Matcher>),
}

impl Mechanism {
    fn is_sentinel(&self) -> bool {
        matches!(self, Mechanism::Default | Mechanism::PermissionDenied | Mechanism::BlackHole)
    }
}

/// Decides whether a route applies to a message and who may use it
#[derive(Debug, Clone)]
pub struct Condition {
    mechanism: Mechanism,
    action: String,
    allowed_groups: Vec<String>,
    help: Option<Help>,
    mention_only: bool,
}

impl Condition {
    fn with_mechanism(mechanism: Mechanism, action: impl Into<String>) -> Self {
        Self {
            mechanism,
            action: action.into(),
            allowed_groups: Vec::new(),
            help: None,
            mention_only: true,
        }
    }

    fn sentinel(mechanism: Mechanism, action: &str, help: &str) -> Self {
        let mut condition = Self::with_mechanism(mechanism, action);
        condition.allowed_groups = vec![EVERYONE.to_string()];
        condition.help = Some(Help::Text(help.to_string()));
        condition
    }

    /// Catch-all used for messages no skill claimed
    pub fn default_sentinel() -> Self {
        Self::sentinel(Mechanism::Default, "unknown", "")
    }

    /// Catch-all used when a route matched but the author lacks permission
    pub fn permission_denied() -> Self {
        Self::sentinel(Mechanism::PermissionDenied, "denied", "This action is not allowed")
    }

    /// Catch-all used to drop a message silently
    pub fn black_hole() -> Self {
        Self::sentinel(Mechanism::BlackHole, "ignore", "")
    }

    /// Compile a pattern condition
    pub fn pattern(pattern: &str, action: impl Into<String>) -> Result<Self, ValidationError> {
        let regex = Regex::new(pattern).map_err(|e| ValidationError::InvalidPattern {
            name: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::regex(regex, action))
    }

    pub fn regex(regex: Regex, action: impl Into<String>) -> Self {
        Self::with_mechanism(Mechanism::Pattern(regex), action)
    }

    pub fn custom<M: Matcher + 'static>(matcher: M, action: impl Into<String>) -> Self {
        Self::with_mechanism(Mechanism::Custom(Arc::new(matcher)), action)
    }

    pub fn allow_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_help(mut self, help: impl Into<Help>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_mention_only(mut self, mention_only: bool) -> Self {
        self.mention_only = mention_only;
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn help(&self) -> Option<&Help> {
        self.help.as_ref()
    }

    pub fn allowed_groups(&self) -> &[String] {
        &self.allowed_groups
    }

    pub fn mention_only(&self) -> bool {
        self.mention_only
    }

    pub fn is_sentinel(&self) -> bool {
        self.mechanism.is_sentinel()
    }

    pub fn matches(&self, text: &str) -> bool {
        match &self.mechanism {
            Mechanism::Default | Mechanism::PermissionDenied | Mechanism::BlackHole => true,
            Mechanism::Pattern(regex) => regex.is_match(text),
            Mechanism::Custom(matcher) => matcher.matches(text),
        }
    }

    /// Positional tokens; sentinels hand back the whole input
    pub fn tokens(&self, text: &str) -> Vec<String> {
        match &self.mechanism {
            Mechanism::Default | Mechanism::PermissionDenied | Mechanism::BlackHole => {
                vec![text.to_string()]
            }
            Mechanism::Pattern(regex) => regex
                .captures(text)
                .map(|caps| {
                    caps.iter()
                        .skip(1)
                        .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                        .collect()
                })
                .unwrap_or_default(),
            Mechanism::Custom(matcher) => matcher.tokens(text),
        }
    }

    /// Named capture groups that took part in the match
    pub fn named_tokens(&self, text: &str) -> HashMap<String, String> {
        match &self.mechanism {
            Mechanism::Pattern(regex) => {
                let Some(caps) = regex.captures(text) else {
                    return HashMap::new();
                };
                regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().to_string()))
                    })
                    .collect()
            }
            Mechanism::Custom(matcher) => matcher.named_tokens(text),
            _ => HashMap::new(),
        }
    }

    fn allows(&self, group: &str) -> bool {
        self.allowed_groups.iter().any(|g| g == group)
    }

    /// Permission check. First satisfied rule wins: `everyone`, global admins,
    /// the managed admins group, then the allowed groups in declaration order.
    pub async fn permits(&self, user: &User, membership: &dyn Membership) -> bool {
        if self.is_sentinel() || self.allows(EVERYONE) {
            return true;
        }

        tracing::debug!("Checking permissions for {}", user.email);

        if membership.is_global_admin(user) {
            return true;
        }
        if member_of(membership, ADMINS, user).await {
            return true;
        }

        for group in &self.allowed_groups {
            if member_of(membership, group, user).await {
                return true;
            }
        }
        false
    }

    /// Mention-only conditions fire on direct address, ambient ones only on
    /// messages that are not directed at the bot.
    pub fn properly_mentions(&self, message: &Message) -> bool {
        if self.is_sentinel() {
            return true;
        }
        (self.mention_only && message.to_bot()) || (!self.mention_only && !message.to_bot())
    }
}

async fn member_of(membership: &dyn Membership, group: &str, user: &User) -> bool {
    match membership.is_member(group, user).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("Membership check for group '{}' failed, denying: {}", group, e);
            false
        }
    }
}
