use super::User;
use chrono::{DateTime, Utc};

/// An inbound message handed over by a sense
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub author: User,
    pub body: String,
    pub channel: String,
    pub private: bool,
    pub mentions_bot: bool,
    pub timestamp: DateTime<Utc>,
    pub platform: String,
}

impl Message {
    pub fn new(author: User, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author,
            body: body.into(),
            channel: String::new(),
            private: false,
            mentions_bot: false,
            timestamp: Utc::now(),
            platform: "unknown".to_string(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn in_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Mark as a direct/private message
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn mentioning_bot(mut self) -> Self {
        self.mentions_bot = true;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Whether mention-only conditions may see this message.
    pub fn to_bot(&self) -> bool {
        self.private || self.mentions_bot
    }

    pub fn text(&self) -> &str {
        self.body.trim()
    }
}
