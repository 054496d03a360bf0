//! Fallback actions for the sentinel routes

use async_trait::async_trait;
use tracing::info;

use super::trait_def::{pick, Skill, SkillContext};
use crate::application::errors::{BotError, SkillError};
use crate::application::routing::DEFAULT_SKILL;

const HELP_POSTFIX: &str = "Use `help` to see what you're allowed to do.";

const DENIED: &[&str] = &[
    "I can't do that. You'll need an admin to adjust your permissions.",
    "I know what you'd like to do, but you don't have permission for that.",
    "You don't have permission to do that.",
];

const UNKNOWN: &[&str] = &[
    "Sorry, I'm not sure what you mean by that.",
    "I don't have the ability to handle that request.",
    "I don't know what that means.",
    "Maybe try rephrasing that request?",
];

pub struct DefaultSkill;

impl DefaultSkill {
    async fn denied(&self, ctx: &SkillContext) -> Result<(), BotError> {
        info!("Denied '{}' from {}", ctx.token(0).unwrap_or_default(), ctx.author().email);
        ctx.react("lock").await?;
        ctx.reply(&format!("{}{} {}", ctx.address_prefix(), pick(DENIED), HELP_POSTFIX))
            .await
    }

    async fn unknown(&self, ctx: &SkillContext) -> Result<(), BotError> {
        info!("Unroutable message '{}' from {}", ctx.token(0).unwrap_or_default(), ctx.author().email);
        ctx.react("shrug").await?;
        ctx.reply(&format!("{}{} {}", ctx.address_prefix(), pick(UNKNOWN), HELP_POSTFIX))
            .await
    }
}

#[async_trait]
impl Skill for DefaultSkill {
    fn name(&self) -> &str {
        DEFAULT_SKILL
    }

    fn description(&self) -> &str {
        "Fallback replies for denied and unroutable messages"
    }

    async fn call(&self, ctx: &SkillContext, action: &str) -> Result<(), BotError> {
        match action {
            "denied" => self.denied(ctx).await,
            "unknown" => self.unknown(ctx).await,
            "ignore" => Ok(()),
            other => Err(SkillError::UnknownAction {
                skill: DEFAULT_SKILL.to_string(),
                action: other.to_string(),
            }
            .into()),
        }
    }
}
