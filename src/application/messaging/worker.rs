//! Worker - runs queued jobs against their skills

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::dispatcher::Job;
use crate::application::errors::BotError;
use crate::application::AppContext;
use crate::domain::traits::Sense;
use crate::skills::SkillContext;

pub struct Worker {
    app: Arc<AppContext>,
    senses: HashMap<String, Arc<dyn Sense>>,
}

impl Worker {
    pub fn new(app: Arc<AppContext>) -> Self {
        Self {
            app,
            senses: HashMap::new(),
        }
    }

    pub fn with_sense(mut self, sense: Arc<dyn Sense>) -> Self {
        self.senses.insert(sense.name().to_string(), sense);
        self
    }

    /// Run a single job
    pub async fn perform(&self, job: Job) -> Result<(), BotError> {
        let route = self
            .app
            .registry
            .find(&job.route)
            .ok_or_else(|| BotError::NotFound(format!("route {}", job.route)))?;
        let sense = self
            .senses
            .get(&job.sense)
            .cloned()
            .ok_or_else(|| BotError::NotFound(format!("sense {}", job.sense)))?;
        let skill = self
            .app
            .skills
            .get(route.destination().as_str())
            .ok_or_else(|| BotError::NotFound(format!("skill {}", route.destination())))?;

        debug!("Running {} for request {}", route.name(), job.request_id);

        let ctx = SkillContext {
            message: job.message.to_message(sense.name()),
            sense,
            route: route.clone(),
            request_id: job.request_id,
            tokens: job.tokens,
            named_tokens: job.named_tokens,
            app: self.app.clone(),
        };

        skill.call(&ctx, route.action()).await
    }

    /// Drain the queue until every sender is gone
    pub async fn run(self, mut queue: mpsc::Receiver<Job>) {
        while let Some(job) = queue.recv().await {
            let route = job.route.clone();
            if let Err(e) = self.perform(job).await {
                error!("Job for {} failed: {}", route, e);
            }
        }
        debug!("Job queue closed, worker stopping");
    }
}
