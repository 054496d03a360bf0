//! Group management from chat

use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::trait_def::{RouteSpec, Skill, SkillContext};
use crate::application::errors::{BotError, SkillError, ValidationError};
use crate::domain::entities::{Help, User, ADMINS};

/// Pseudo-group for the configured admin allow-list. It lives in config and
/// cannot be edited from chat.
const GLOBAL_ADMINS: &str = "global admins";

const GROUP_ADMINS: &str = "group_admins";

fn looks_like_email(raw: &str) -> bool {
    matches!(raw.split_once('@'), Some((local, domain)) if !local.is_empty() && !domain.is_empty())
}

pub struct GroupsSkill;

enum Lookup {
    Found(User),
    Missing(String),
}

impl GroupsSkill {
    async fn find_user(&self, ctx: &SkillContext, raw: &str) -> Lookup {
        let raw = raw.trim();
        let found = if looks_like_email(raw) {
            ctx.sense.find_by_email(raw).await
        } else {
            ctx.sense.find_by_handle(raw.trim_start_matches('@')).await
        };

        match found {
            Ok(Some(user)) => Lookup::Found(user),
            Ok(None) => Lookup::Missing(raw.to_string()),
            Err(e) => {
                warn!("User lookup for '{}' failed: {}", raw, e);
                Lookup::Missing(raw.to_string())
            }
        }
    }

    /// Users and group name from `<users> to|from <group>`
    fn targets<'a>(&self, ctx: &'a SkillContext) -> Result<(&'a str, &'a str), BotError> {
        match (ctx.token(0), ctx.token(1)) {
            (Some(users), Some(group)) => Ok((users, group.trim())),
            _ => Err(SkillError::InvalidArgs("expected USERS and GROUP".to_string()).into()),
        }
    }

    async fn add_to_group(&self, ctx: &SkillContext) -> Result<(), BotError> {
        let (users, group_name) = self.targets(ctx)?;
        if group_name == GLOBAL_ADMINS {
            return ctx.reply("Sorry, I can't manipulate global admins this way...").await;
        }

        let group = ctx.app.groups().group(group_name);
        info!("Adding {} to group {}", users, group_name);

        let mut already = Vec::new();
        let mut missing = Vec::new();
        for raw in users.split(',') {
            match self.find_user(ctx, raw).await {
                Lookup::Found(user) => {
                    if !group.add(&user).await? {
                        already.push(ctx.mention(&user));
                    }
                }
                Lookup::Missing(raw) => missing.push(raw),
            }
        }

        if !already.is_empty() {
            let text = if already.len() > 1 { "were already members" } else { "was already a member" };
            ctx.reply(&format!("Looks like [{}] {} of {}", already.join(", "), text, group_name))
                .await?;
        }
        if !missing.is_empty() {
            ctx.reply(&format!("I couldn't find [{}]", missing.join(", "))).await?;
        }
        ctx.reply(&format!("Done adding users to {}!", group_name)).await
    }

    async fn remove_from_group(&self, ctx: &SkillContext) -> Result<(), BotError> {
        let (users, group_name) = self.targets(ctx)?;
        if group_name == GLOBAL_ADMINS {
            return ctx.reply("Sorry, I can't manipulate global admins this way...").await;
        }

        let group = ctx.app.groups().group(group_name);
        debug!("Removing {} from group '{}'", users, group_name);

        let mut absent = Vec::new();
        let mut missing = Vec::new();
        for raw in users.split(',') {
            match self.find_user(ctx, raw).await {
                Lookup::Found(user) => {
                    if !group.remove(&user).await? {
                        absent.push(ctx.mention(&user));
                    }
                }
                Lookup::Missing(raw) => missing.push(raw),
            }
        }

        if !absent.is_empty() {
            let text = if absent.len() > 1 { "were members" } else { "was a member" };
            ctx.reply(&format!("I don't think [{}] {} of {}", absent.join(", "), text, group_name))
                .await?;
        }
        if !missing.is_empty() {
            ctx.reply(&format!("I couldn't find [{}]", missing.join(", "))).await?;
        }
        ctx.reply("Done removing users from groups!").await
    }

    async fn list_all_groups(&self, ctx: &SkillContext) -> Result<(), BotError> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let admins = ctx.app.permissions.admins();
        if !admins.is_empty() {
            groups.insert(GLOBAL_ADMINS.to_string(), admins.to_vec());
        }

        let directory = ctx.app.groups();
        for name in directory.names().await? {
            let members = directory.group(&name).members().await?;
            groups.insert(name, members);
        }

        ctx.reply(&ctx.codify(&to_yaml(&groups)?)).await
    }

    async fn list_my_groups(&self, ctx: &SkillContext) -> Result<(), BotError> {
        let mut groups = Vec::new();
        if ctx.app.permissions.admins().contains(&ctx.author().normalized_email()) {
            groups.push(GLOBAL_ADMINS.to_string());
        }
        groups.extend(ctx.app.groups().memberships(ctx.author()).await?);

        ctx.reply(&ctx.codify(&to_yaml(&groups)?)).await
    }

    async fn cleanup_groups(&self, ctx: &SkillContext) -> Result<(), BotError> {
        let removed = ctx.app.groups().cleanup().await?;
        ctx.reply(&format!("I removed these empty groups: {}", removed.join(", "))).await
    }
}

fn to_yaml<T: serde::Serialize>(value: &T) -> Result<String, BotError> {
    serde_yaml::to_string(value).map_err(|e| BotError::Internal(e.to_string()))
}

#[async_trait]
impl Skill for GroupsSkill {
    fn name(&self) -> &str {
        "groups"
    }

    fn description(&self) -> &str {
        "Manage the groups used for permissions"
    }

    fn routes(&self) -> Result<Vec<RouteSpec>, ValidationError> {
        let managers = [ADMINS, GROUP_ADMINS];
        Ok(vec![
            RouteSpec::pattern(r"^add (.+) to (.+)$", "add_to_group")?
                .with_help(Help::usage("add USER[,USER] to GROUP", "Add USER(s) to a GROUP"))
                .allow_groups(managers),
            RouteSpec::pattern(r"^remove (.+) from (.+)$", "remove_from_group")?
                .with_help(Help::usage("remove USER[,USER] from GROUP", "Remove USER(s) from a GROUP"))
                .allow_groups(managers),
            RouteSpec::pattern(r"^(describe|list|print|show) (all )?(groups|group memberships)$", "list_all_groups")?
                .with_help(Help::usage("list all groups", "List all groups and their members"))
                .allow_groups(managers),
            RouteSpec::pattern(r"^cleanup groups$", "cleanup_groups")?
                .with_help(Help::usage("cleanup groups", "Remove empty groups"))
                .allow_groups(managers),
            RouteSpec::pattern(r"^((list )?my )?groups$", "list_my_groups")?
                .with_help(Help::usage("list my groups", "List my group memberships")),
        ])
    }

    async fn call(&self, ctx: &SkillContext, action: &str) -> Result<(), BotError> {
        match action {
            "add_to_group" => self.add_to_group(ctx).await,
            "remove_from_group" => self.remove_from_group(ctx).await,
            "list_all_groups" => self.list_all_groups(ctx).await,
            "list_my_groups" => self.list_my_groups(ctx).await,
            "cleanup_groups" => self.cleanup_groups(ctx).await,
            other => Err(SkillError::UnknownAction {
                skill: self.name().to_string(),
                action: other.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_detection() {
        assert!(looks_like_email("amy@example.com"));
        assert!(!looks_like_email("@amy"));
        assert!(!looks_like_email("amy@"));
        assert!(!looks_like_email("amy"));
    }

    #[test]
    fn test_routes_split_tokens() {
        let routes = GroupsSkill.routes().unwrap();
        let add = routes.iter().find(|r| r.condition.action() == "add_to_group").unwrap();
        assert_eq!(
            add.condition.tokens("add amy@example.com,bob@example.com to ops"),
            vec!["amy@example.com,bob@example.com".to_string(), "ops".to_string()]
        );
        assert_eq!(add.condition.allowed_groups(), [ADMINS.to_string(), GROUP_ADMINS.to_string()]);
    }

    #[test]
    fn test_list_routes_do_not_overlap() {
        let routes = GroupsSkill.routes().unwrap();
        let all = routes.iter().find(|r| r.condition.action() == "list_all_groups").unwrap();
        let mine = routes.iter().find(|r| r.condition.action() == "list_my_groups").unwrap();

        for text in ["list all groups", "show group memberships", "list groups"] {
            assert!(all.condition.matches(text), "{}", text);
            assert!(!mine.condition.matches(text), "{}", text);
        }
        for text in ["groups", "my groups", "list my groups"] {
            assert!(mine.condition.matches(text), "{}", text);
            assert!(!all.condition.matches(text), "{}", text);
        }
        assert!(mine.condition.allowed_groups().contains(&crate::domain::entities::EVERYONE.to_string()));
    }
}
