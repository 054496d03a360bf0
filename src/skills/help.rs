use async_trait::async_trait;
use std::collections::BTreeMap;

use super::trait_def::{acknowledgement, pick, RouteSpec, Skill, SkillContext};
use crate::application::errors::{BotError, SkillError, ValidationError};
use crate::application::routing::HelpEntry;
use crate::domain::entities::Help;

const PATTERN: &str = r"(?i)^help(?:\s+(?P<skill>\w+)(?:(?:#|\s+)(?P<action>\w+))?)?$";

const PRIVATE_NOTICES: &[&str] = &[
    "I'll send you a DM to go over that with you.",
    "I'll DM you the details.",
    "Look for a private message with those details.",
    "You should have a private message with that information shortly.",
];

/// Lists the actions a user may run, always privately
pub struct HelpSkill;

#[async_trait]
impl Skill for HelpSkill {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Help for all skills, one skill, or one action"
    }

    fn routes(&self) -> Result<Vec<RouteSpec>, ValidationError> {
        Ok(vec![RouteSpec::pattern(PATTERN, "help")?.with_help(Help::usage(
            "help [skill [action]]",
            "Allows asking for help, either for all skills or for a particular skill or action",
        ))])
    }

    async fn call(&self, ctx: &SkillContext, action: &str) -> Result<(), BotError> {
        if action != "help" {
            return Err(SkillError::UnknownAction {
                skill: self.name().to_string(),
                action: action.to_string(),
            }
            .into());
        }

        ctx.react("book").await?;
        if !ctx.message.private {
            ctx.reply(&format!("{} {}", acknowledgement(), pick(PRIVATE_NOTICES))).await?;
        }

        let allowed = ctx.app.registry.help(ctx.author(), &ctx.app.permissions).await;
        let text = help_text(&allowed, ctx.named_token("skill"), ctx.named_token("action"));
        ctx.private_reply(&text).await
    }
}

pub fn help_text(allowed: &BTreeMap<String, Vec<HelpEntry>>, skill: Option<&str>, action: Option<&str>) -> String {
    let Some(skill) = skill else {
        let mut lines = vec!["*All known actions:*\n".to_string()];
        for (namespace, entries) in allowed {
            lines.push(format!("* *{}*:", namespace));
            lines.extend(entries.iter().map(entry_text));
            lines.push(" --- ".to_string());
        }
        return lines.join("\n");
    };

    let entries = allowed.get(skill).map(Vec::as_slice).unwrap_or_default();

    match action {
        Some(action) => {
            let wanted = format!("{}#{}", skill, action);
            match entries.iter().find(|entry| entry.name == wanted) {
                Some(entry) => format!("## Help for {}:\n{}", wanted, entry_text(entry)),
                None => format!("I couldn't find any '{}' action on the '{}' skill...", action, skill),
            }
        }
        None if entries.is_empty() => {
            format!("I couldn't find any routes related to a '{}' skill...", skill)
        }
        None => {
            let mut lines = vec![format!("## Help for {}:\n", skill)];
            lines.extend(entries.iter().map(entry_text));
            lines.join("\n")
        }
    }
}

fn entry_text(entry: &HelpEntry) -> String {
    match &entry.help {
        Help::Text(usage) => format!("    *Usage:* {}", usage),
        Help::Usage { usage, description: Some(description) } => {
            format!("    *Usage:* {}\n    *Description:* {}", usage, description)
        }
        Help::Usage { usage, description: None } => format!("    *Usage:* {}", usage),
    }
}
