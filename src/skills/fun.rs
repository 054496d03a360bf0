use async_trait::async_trait;

use super::trait_def::{pick, RouteSpec, Skill, SkillContext};
use crate::application::errors::{BotError, SkillError, ValidationError};
use crate::infrastructure::config::ConfigEntry;

const GREETINGS: &[&str] = &["Hello there!", "Hi!", "Hi, how's it going?", "How can I be of service?"];

/// Small talk
pub struct FunSkill;

#[async_trait]
impl Skill for FunSkill {
    fn name(&self) -> &str {
        "fun"
    }

    fn description(&self) -> &str {
        "Built-in small talk"
    }

    fn routes(&self) -> Result<Vec<RouteSpec>, ValidationError> {
        Ok(vec![RouteSpec::pattern(r"(?i)^(hello|hi)$", "hello")?])
    }

    fn settings(&self) -> Vec<ConfigEntry> {
        vec![ConfigEntry::new("greeting")]
    }

    async fn call(&self, ctx: &SkillContext, action: &str) -> Result<(), BotError> {
        match action {
            "hello" => {
                let greeting = ctx.config("greeting").unwrap_or_else(|| pick(GREETINGS).to_string());
                ctx.reply(&greeting).await
            }
            other => Err(SkillError::UnknownAction {
                skill: self.name().to_string(),
                action: other.to_string(),
            }
            .into()),
        }
    }
}
