//! Message dispatcher - resolves messages to routes and queues them for workers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::application::AppContext;
use crate::domain::entities::{Message, User};

/// Default depth of the job queue between dispatcher and workers
pub const QUEUE_CAPACITY: usize = 256;

/// A resolved message waiting for a worker. Carries the route by name so
/// the worker looks it up again in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub request_id: String,
    pub sense: String,
    pub route: String,
    pub message: JobMessage,
    pub tokens: Vec<String>,
    pub named_tokens: HashMap<String, String>,
}

/// The parts of a message a skill needs after queueing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMessage {
    pub id: String,
    pub author_id: String,
    pub author_email: String,
    pub author_handle: Option<String>,
    pub body: String,
    pub channel: String,
    pub private: bool,
    pub mentions_bot: bool,
}

impl From<&Message> for JobMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            author_id: message.author.id.clone(),
            author_email: message.author.email.clone(),
            author_handle: message.author.handle.clone(),
            body: message.body.clone(),
            channel: message.channel.clone(),
            private: message.private,
            mentions_bot: message.mentions_bot,
        }
    }
}

impl JobMessage {
    pub fn to_message(&self, platform: &str) -> Message {
        let mut author = User::new(&self.author_id, &self.author_email);
        if let Some(handle) = &self.author_handle {
            author = author.with_handle(handle);
        }

        let mut message = Message::new(author, &self.body)
            .with_id(&self.id)
            .in_channel(&self.channel)
            .with_platform(platform);
        message.private = self.private;
        message.mentions_bot = self.mentions_bot;
        message
    }
}

pub fn job_queue(capacity: usize) -> (mpsc::Sender<Job>, mpsc::Receiver<Job>) {
    mpsc::channel(capacity)
}

/// Message dispatcher - routes inbound messages and enqueues the outcome
pub struct MessageDispatcher {
    app: Arc<AppContext>,
    queue: mpsc::Sender<Job>,
}

impl MessageDispatcher {
    pub fn new(app: Arc<AppContext>, queue: mpsc::Sender<Job>) -> Self {
        Self { app, queue }
    }

    /// Resolve and enqueue. Returns the queued job, or `None` when the
    /// message was dropped by the black hole.
    pub async fn dispatch(&self, sense: &str, message: Message) -> Result<Option<Job>, BotError> {
        let registry = &self.app.registry;
        let route = registry.route(&message, &self.app.permissions).await;

        if Arc::ptr_eq(&route, registry.black_hole()) {
            tracing::debug!("Dropping message {} from {}", message.id, message.author);
            return Ok(None);
        }

        let text = message.text();
        let job = Job {
            request_id: uuid::Uuid::new_v4().to_string(),
            sense: sense.to_string(),
            route: route.name().to_string(),
            tokens: route.tokens(text),
            named_tokens: route.named_tokens(text),
            message: JobMessage::from(&message),
        };

        tracing::info!("Queueing {} for {} ({})", job.route, message.author, job.request_id);
        self.queue
            .send(job.clone())
            .await
            .map_err(|e| BotError::QueueClosed(e.to_string()))?;
        Ok(Some(job))
    }
}
