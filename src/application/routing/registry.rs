use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use crate::application::errors::ValidationError;
use crate::domain::entities::{Condition, Help, Message, Route, SkillKind, User, DEFAULT_PRIORITY};
use crate::domain::traits::Membership;

/// Skill kind the sentinel routes point at
pub const DEFAULT_SKILL: &str = "default";

/// One line of help for a route the user may use
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelpEntry {
    pub name: String,
    pub help: Help,
}

/// Resolves messages to routes.
///
/// Routes are kept ordered by priority, highest first. Routes with equal
/// priority keep their registration order, so the earliest one wins.
pub struct Registry {
    routes: Vec<Arc<Route>>,
    kinds: BTreeSet<SkillKind>,
    default_route: Arc<Route>,
    permission_denied: Arc<Route>,
    black_hole: Arc<Route>,
}

impl Registry {
    pub fn new() -> Self {
        let default_kind = SkillKind::new(DEFAULT_SKILL);
        let sentinel = |name: &str, condition: Condition, priority: u8| {
            Arc::new(Route::sentinel(name, default_kind.clone(), condition, priority))
        };

        Self {
            default_route: sentinel("default", Condition::default_sentinel(), 0),
            permission_denied: sentinel("permission_denied", Condition::permission_denied(), 99),
            black_hole: sentinel("black_hole", Condition::black_hole(), 0),
            routes: Vec::new(),
            kinds: BTreeSet::from([default_kind]),
        }
    }

    /// Allow routes to target `kind`
    pub(crate) fn allow_skill(&mut self, kind: SkillKind) {
        self.kinds.insert(kind);
    }

    pub fn knows_skill(&self, name: &str) -> bool {
        self.kinds.iter().any(|kind| kind.as_str() == name)
    }

    pub fn register(&mut self, name: &str, skill: &str, condition: Condition) -> Result<Arc<Route>, ValidationError> {
        self.register_with_priority(name, skill, condition, DEFAULT_PRIORITY)
    }

    pub fn register_with_priority(
        &mut self,
        name: &str,
        skill: &str,
        condition: Condition,
        priority: i64,
    ) -> Result<Arc<Route>, ValidationError> {
        let kind = self
            .kinds
            .iter()
            .find(|kind| kind.as_str() == skill)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownSkill(skill.to_string()))?;

        if self.find(name).is_some() {
            return Err(ValidationError::DuplicateRoute(name.to_string()));
        }

        let route = Arc::new(Route::new(name, kind, condition, priority)?);
        let at = self
            .routes
            .partition_point(|existing| existing.priority() >= route.priority());
        self.routes.insert(at, route.clone());

        tracing::debug!("Registered route {} -> {} (priority {})", route.name(), skill, route.priority());
        Ok(route)
    }

    /// Resolve a message to exactly one route. Never fails: unmatched
    /// messages end at the default route or the black hole.
    pub async fn route(&self, message: &Message, membership: &dyn Membership) -> Arc<Route> {
        match self.resolve(message, membership).await {
            Some(route) => route,
            None if message.to_bot() => self.default_route.clone(),
            None => self.black_hole.clone(),
        }
    }

    /// Walk the candidates in order. `None` when nothing matched at all.
    pub async fn resolve(&self, message: &Message, membership: &dyn Membership) -> Option<Arc<Route>> {
        let text = message.text();

        for candidate in &self.routes {
            if !candidate.matches(text) {
                continue;
            }

            if !candidate.permits(&message.author, membership).await {
                tracing::debug!("{} matched {} without permission", message.author, candidate.name());
                return Some(self.permission_denied.clone());
            }

            if candidate.properly_mentions(message) || message.private {
                tracing::debug!("Routing '{}' to {}", text, candidate.name());
                return Some(candidate.clone());
            }

            tracing::debug!("{} matched {} on the wrong channel", message.author, candidate.name());
            return Some(self.black_hole.clone());
        }

        None
    }

    /// Help for every mention-only route the user may use, grouped by skill
    pub async fn help(&self, user: &User, membership: &dyn Membership) -> BTreeMap<String, Vec<HelpEntry>> {
        let mut sections: BTreeMap<String, Vec<HelpEntry>> = BTreeMap::new();

        for route in &self.routes {
            let Some(help) = route.help() else {
                continue;
            };
            if !route.mention_only() || !route.permits(user, membership).await {
                continue;
            }

            sections
                .entry(route.destination().to_string())
                .or_default()
                .push(HelpEntry {
                    name: route.name().to_string(),
                    help: help.clone(),
                });
        }

        sections
    }

    /// Look up a route by name, sentinels included
    pub fn find(&self, name: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .chain([&self.default_route, &self.permission_denied, &self.black_hole])
            .find(|route| route.name() == name)
            .cloned()
    }

    /// Registered routes in resolution order
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn default_route(&self) -> &Arc<Route> {
        &self.default_route
    }

    pub fn permission_denied(&self) -> &Arc<Route> {
        &self.permission_denied
    }

    pub fn black_hole(&self) -> &Arc<Route> {
        &self.black_hole
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
