//! In-process sense that records what the bot says

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use crate::application::errors::BotError;
use crate::domain::entities::{Message, User};
use crate::domain::traits::{Feature, Sense};

pub const MEMORY_SENSE: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Reply { channel: String, text: String },
    Private { user: String, text: String },
    Reaction { message: String, reaction: String },
}

/// Sense used by tests and embedders: nothing leaves the process
pub struct MemorySense {
    features: Vec<Feature>,
    users: HashMap<String, User>,
    sent: Mutex<Vec<Outbound>>,
}

impl MemorySense {
    pub fn new() -> Self {
        Self {
            features: vec![Feature::Reactions, Feature::PrivateMessages],
            users: HashMap::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Make a user discoverable by email and handle
    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.normalized_email(), user);
        self
    }

    pub async fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().await.clone()
    }

    /// Text of every reply and private reply, in order
    pub async fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|out| match out {
                Outbound::Reply { text, .. } | Outbound::Private { text, .. } => Some(text.clone()),
                Outbound::Reaction { .. } => None,
            })
            .collect()
    }

    async fn push(&self, outbound: Outbound) {
        self.sent.lock().await.push(outbound);
    }
}

impl Default for MemorySense {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sense for MemorySense {
    fn name(&self) -> &str {
        MEMORY_SENSE
    }

    fn features(&self) -> &[Feature] {
        &self.features
    }

    async fn reply(&self, message: &Message, text: &str) -> Result<(), BotError> {
        self.push(Outbound::Reply {
            channel: message.channel.clone(),
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn private_reply(&self, message: &Message, text: &str) -> Result<(), BotError> {
        self.push(Outbound::Private {
            user: message.author.email.clone(),
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn react(&self, message: &Message, reaction: &str) -> Result<(), BotError> {
        self.push(Outbound::Reaction {
            message: message.id.clone(),
            reaction: reaction.to_string(),
        })
        .await;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, BotError> {
        Ok(self.users.get(&email.trim().to_lowercase()).cloned())
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, BotError> {
        Ok(self
            .users
            .values()
            .find(|user| user.handle.as_deref() == Some(handle))
            .cloned())
    }
}
