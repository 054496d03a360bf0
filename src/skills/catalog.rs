//! Skill catalog - the set of skills routes may point at

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::application::errors::ValidationError;
use crate::application::routing::{Registry, DEFAULT_SKILL};
use crate::domain::entities::SkillKind;
use crate::infrastructure::config::{ConfigEntry, SettingsBuilder};
use crate::skills::trait_def::{Skill, SkillInfo};

/// Owns every loaded skill, keyed by name
#[derive(Default)]
pub struct SkillCatalog {
    skills: BTreeMap<String, Arc<dyn Skill>>,
}

impl SkillCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the built-in skills
    pub fn with_builtin() -> Result<Self, ValidationError> {
        let mut catalog = Self::new();
        catalog.register(super::default::DefaultSkill)?;
        catalog.register(super::groups::GroupsSkill)?;
        catalog.register(super::help::HelpSkill)?;
        catalog.register(super::fun::FunSkill)?;
        catalog.register(super::diagnostics::DiagnosticsSkill)?;
        Ok(catalog)
    }

    pub fn register<S: Skill + 'static>(&mut self, skill: S) -> Result<(), ValidationError> {
        self.register_arc(Arc::new(skill))
    }

    pub fn register_arc(&mut self, skill: Arc<dyn Skill>) -> Result<(), ValidationError> {
        let name = skill.name().to_string();
        if name.trim().is_empty() {
            return Err(ValidationError::UnknownSkill(name));
        }
        if self.skills.contains_key(&name) {
            return Err(ValidationError::DuplicateSkill(name));
        }

        info!("Registering skill: {}", name);
        self.skills.insert(name, skill);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.skills.get(name).cloned()
    }

    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    /// Token for a loaded skill; the only way to obtain one
    pub fn kind(&self, name: &str) -> Result<SkillKind, ValidationError> {
        if self.has_skill(name) {
            Ok(SkillKind::new(name))
        } else {
            Err(ValidationError::UnknownSkill(name.to_string()))
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.skills.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Declare each skill's settings under `skills.<name>.`
    pub fn declare_settings(&self, builder: &mut SettingsBuilder) {
        for (name, skill) in &self.skills {
            builder.declare_all(skill.settings().into_iter().map(|entry| ConfigEntry {
                key: format!("skills.{}.{}", name, entry.key),
                ..entry
            }));
        }
    }

    /// Build a registry holding every skill's routes
    pub fn registry(&self) -> Result<Registry, ValidationError> {
        let mut registry = Registry::new();
        self.install(&mut registry)?;
        Ok(registry)
    }

    pub fn install(&self, registry: &mut Registry) -> Result<(), ValidationError> {
        for name in self.skills.keys() {
            registry.allow_skill(self.kind(name)?);
        }

        for (name, skill) in &self.skills {
            for spec in skill.routes()? {
                let route_name = spec.route_name(name);
                registry.register_with_priority(&route_name, name, spec.condition, spec.priority)?;
            }
        }

        info!("Installed {} routes from {} skills", registry.len(), self.skills.len());
        Ok(())
    }

    pub fn list_skills(&self, registry: &Registry) -> Vec<SkillInfo> {
        self.skills
            .iter()
            .map(|(name, skill)| SkillInfo {
                name: name.clone(),
                description: skill.description().to_string(),
                routes: registry
                    .routes()
                    .iter()
                    .filter(|route| route.destination().as_str() == name)
                    .map(|route| route.name().to_string())
                    .collect(),
            })
            .collect()
    }

    /// Whether the fallback skill is loaded; without it sentinel routes have
    /// nowhere to go
    pub fn has_fallback(&self) -> bool {
        self.has_skill(DEFAULT_SKILL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::BotError;
    use crate::skills::trait_def::{RouteSpec, SkillContext};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Skill for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Repeats things"
        }

        fn routes(&self) -> Result<Vec<RouteSpec>, ValidationError> {
            Ok(vec![RouteSpec::pattern("^echo (.+)$", "echo")?.with_help("echo TEXT")])
        }

        fn settings(&self) -> Vec<ConfigEntry> {
            vec![ConfigEntry::new("prefix").required()]
        }

        async fn call(&self, ctx: &SkillContext, _action: &str) -> Result<(), BotError> {
            ctx.reply(ctx.token(0).unwrap_or_default()).await
        }
    }

    #[test]
    fn test_duplicate_skill_is_rejected() {
        let mut catalog = SkillCatalog::new();
        catalog.register(Echo).unwrap();
        assert_eq!(catalog.register(Echo), Err(ValidationError::DuplicateSkill("echo".to_string())));
    }

    #[test]
    fn test_kind_only_for_loaded_skills() {
        let mut catalog = SkillCatalog::new();
        catalog.register(Echo).unwrap();
        assert_eq!(catalog.kind("echo").unwrap().as_str(), "echo");
        assert!(matches!(catalog.kind("nope"), Err(ValidationError::UnknownSkill(_))));
    }

    #[test]
    fn test_builtin_registry() {
        let catalog = SkillCatalog::with_builtin().unwrap();
        assert!(catalog.has_fallback());
        let registry = catalog.registry().unwrap();
        assert!(registry.find("fun#hello").is_some());
        assert!(registry.find("help#help").is_some());
        assert!(registry.find("groups#add_to_group").is_some());
        assert!(registry.knows_skill("diagnostics"));

        let info = catalog.list_skills(&registry);
        let fun = info.iter().find(|s| s.name == "fun").unwrap();
        assert_eq!(fun.routes, vec!["fun#hello".to_string()]);
    }

    #[test]
    fn test_settings_are_namespaced() {
        let mut catalog = SkillCatalog::new();
        catalog.register(Echo).unwrap();
        let mut builder = SettingsBuilder::new();
        catalog.declare_settings(&mut builder);
        let settings = builder.build();
        assert_eq!(settings.missing("skills.echo"), vec!["skills.echo.prefix".to_string()]);
    }
}
