use std::sync::Arc;

use crate::application::errors::{BotError, ConfigError, ValidationError};
use crate::application::routing::{Permissions, Registry, DEFAULT_SKILL};
use crate::application::services::GroupDirectory;
use crate::domain::traits::Store;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::config::{Config, Settings, StorageBackend};
use crate::infrastructure::storage::{EnvelopeCipher, MemoryStore, SqliteStore, Storage};
use crate::skills::SkillCatalog;

/// Shared state handed to workers and skills. Built once at startup.
pub struct AppContext {
    pub storage: Arc<Storage>,
    pub cache: Arc<Cache>,
    pub settings: Arc<Settings>,
    pub registry: Arc<Registry>,
    pub skills: Arc<SkillCatalog>,
    pub permissions: Permissions,
    /// Names of the senses feeding this process
    pub senses: Vec<String>,
}

impl AppContext {
    pub fn new(
        storage: Arc<Storage>,
        cache: Arc<Cache>,
        settings: Settings,
        skills: SkillCatalog,
        registry: Registry,
    ) -> Self {
        let permissions = Permissions::new(settings.admins(), GroupDirectory::new(storage.clone()));
        Self {
            storage,
            cache,
            settings: Arc::new(settings),
            registry: Arc::new(registry),
            skills: Arc::new(skills),
            permissions,
            senses: Vec::new(),
        }
    }

    /// Wire storage, settings and routes from a loaded config
    pub fn from_config(config: &Config, skills: SkillCatalog) -> Result<Self, BotError> {
        if !skills.has_fallback() {
            return Err(ValidationError::MissingFallback(DEFAULT_SKILL.to_string()).into());
        }

        let backend: Arc<dyn Store> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Sqlite => {
                let path = config
                    .storage
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingField("storage.path".to_string()))?;
                tracing::info!("Opening SQLite storage at {}", path.display());
                Arc::new(SqliteStore::open(path)?)
            }
        };

        let cipher = EnvelopeCipher::from_secret(config.security.encryption_key.as_deref());
        let storage = Arc::new(Storage::new(backend, cipher));

        let mut builder = config.settings_builder();
        skills.declare_settings(&mut builder);
        builder.load_env();
        let settings = builder.build();

        for name in skills.names() {
            if !settings.is_configured(&format!("skills.{}", name)) {
                tracing::warn!("Skill {} is missing required settings", name);
            }
        }

        let registry = skills.registry()?;
        Ok(Self::new(storage, Arc::new(Cache::in_memory()), settings, skills, registry))
    }

    pub fn with_sense(mut self, name: impl Into<String>) -> Self {
        self.senses.push(name.into());
        self
    }

    pub fn groups(&self) -> &GroupDirectory {
        self.permissions.groups()
    }
}
