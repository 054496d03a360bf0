//! Console sense for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use crate::application::errors::BotError;
use crate::domain::entities::{Message, User};
use crate::domain::traits::{Feature, Sense};

pub const CONSOLE_SENSE: &str = "console";

/// Reads lines from stdin and prints replies.
///
/// A line starting with `@<bot>` addresses the bot in the shared channel,
/// `/dm ` sends a private message, anything else is ambient chatter.
pub struct ConsoleSense {
    bot: User,
    user: User,
}

impl ConsoleSense {
    pub fn new(bot_name: impl Into<String>, user: User) -> Self {
        let bot_name = bot_name.into();
        Self {
            bot: User::new(&bot_name, format!("{}@localhost", bot_name)).with_handle(&bot_name),
            user,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Turn a typed line into a message, `None` for blank lines
    pub fn parse_line(&self, line: &str) -> Option<Message> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let message = Message::new(self.user.clone(), line)
            .in_channel("console")
            .with_platform(CONSOLE_SENSE);

        if let Some(rest) = line.strip_prefix("/dm ") {
            let mut message = message.private();
            message.body = rest.trim().to_string();
            return Some(message);
        }

        let mention = format!("@{}", self.bot.label());
        let addressed = line
            .strip_prefix(&mention)
            .filter(|rest| rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == ',' || c == ':'));
        if let Some(rest) = addressed {
            let mut message = message.mentioning_bot();
            message.body = rest.trim_start_matches([',', ':']).trim().to_string();
            return Some(message);
        }

        Some(message)
    }

    /// Feed stdin lines to `handle` until EOF or `quit`
    pub async fn run<F, Fut>(&self, mut handle: F) -> Result<(), BotError>
    where
        F: FnMut(Message) -> Fut,
        Fut: std::future::Future<Output = Result<(), BotError>>,
    {
        tracing::info!("Starting console sense (dev mode)");
        println!("Type '@{} help' to talk to the bot, '/dm <text>' for private, 'quit' to exit.", self.bot.label());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| BotError::Internal(format!("stdin: {}", e)))?
        {
            if matches!(line.trim(), "quit" | "exit") {
                break;
            }
            if let Some(message) = self.parse_line(&line) {
                if let Err(e) = handle(message).await {
                    tracing::error!("Failed to handle console message: {}", e);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Sense for ConsoleSense {
    fn name(&self) -> &str {
        CONSOLE_SENSE
    }

    fn features(&self) -> &[Feature] {
        &[Feature::PrivateMessages]
    }

    async fn reply(&self, _message: &Message, text: &str) -> Result<(), BotError> {
        println!("[BOT] {}", text);
        Ok(())
    }

    async fn private_reply(&self, _message: &Message, text: &str) -> Result<(), BotError> {
        println!("[BOT (private)] {}", text);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, BotError> {
        Ok(Some(User::new(email, email)))
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, BotError> {
        Ok(Some(User::new(handle, format!("{}@localhost", handle)).with_handle(handle)))
    }

    async fn whoami(&self) -> Result<User, BotError> {
        Ok(self.bot.clone())
    }
}
