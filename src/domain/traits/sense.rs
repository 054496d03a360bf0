use async_trait::async_trait;
use crate::application::errors::BotError;
use crate::domain::entities::{Message, User};

/// Optional capabilities a sense may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Reactions,
    Blocks,
    PrivateMessages,
}

/// Sense trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Sense: Send + Sync {
    /// Name the sense is registered under
    fn name(&self) -> &str;

    fn features(&self) -> &[Feature] {
        &[]
    }

    fn supports(&self, feature: Feature) -> bool {
        self.features().contains(&feature)
    }

    /// Reply in the conversation the message came from
    async fn reply(&self, message: &Message, text: &str) -> Result<(), BotError>;

    /// Reply directly to the author
    async fn private_reply(&self, message: &Message, text: &str) -> Result<(), BotError> {
        self.reply(message, text).await
    }

    async fn react(&self, _message: &Message, reaction: &str) -> Result<(), BotError> {
        Err(BotError::NotImplemented(format!("react ({})", reaction)))
    }

    fn mention(&self, user: &User) -> String {
        format!("@{}", user.label())
    }

    fn codify(&self, text: &str) -> String {
        format!("```\n{}```", text)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, BotError> {
        Err(BotError::NotImplemented("find_by_email".to_string()))
    }

    async fn find_by_handle(&self, _handle: &str) -> Result<Option<User>, BotError> {
        Err(BotError::NotImplemented("find_by_handle".to_string()))
    }

    /// The bot's own user on this platform
    async fn whoami(&self) -> Result<User, BotError> {
        Err(BotError::NotImplemented("whoami".to_string()))
    }
}
