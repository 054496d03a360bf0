use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use super::trait_def::{RouteSpec, Skill, SkillContext};
use crate::application::errors::{BotError, SkillError, ValidationError};
use crate::application::AppContext;
use crate::domain::entities::Help;

/// Round-trip timings for the cache and the encrypted store
#[derive(Debug, Clone, PartialEq)]
pub struct StorageProbe {
    pub ok: bool,
    pub cache_write: Duration,
    pub cache_read: Duration,
    pub store_write: Duration,
    pub store_read: Duration,
}

/// Write and read back a throwaway value through both layers
pub async fn probe_storage(app: &AppContext) -> Result<StorageProbe, BotError> {
    let cache_key = format!("skills.diagnostics.probe.{}", uuid::Uuid::new_v4());
    let store_key = format!("diagnostics.probe.{}", uuid::Uuid::new_v4());
    let value = uuid::Uuid::new_v4().to_string();

    let started = Instant::now();
    app.cache
        .fetch_or_compute(&cache_key, Duration::from_secs(60), || async { value.clone() })
        .await?;
    let cache_write = started.elapsed();

    let started = Instant::now();
    let cached: Option<String> = app.cache.load(&cache_key).await?;
    let cache_read = started.elapsed();

    let started = Instant::now();
    app.storage.store(&store_key, &value).await?;
    let store_write = started.elapsed();

    let started = Instant::now();
    let stored: Option<String> = app.storage.load(&store_key).await?;
    let store_read = started.elapsed();

    app.cache.delete(&cache_key).await?;
    app.storage.delete(&store_key).await?;

    Ok(StorageProbe {
        ok: cached.as_deref() == Some(value.as_str()) && stored.as_deref() == Some(value.as_str()),
        cache_write,
        cache_read,
        store_write,
        store_read,
    })
}

pub async fn status_report(app: &AppContext) -> Result<String, BotError> {
    let mut lines = vec![format!("*Framework Version:* {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))];

    lines.push("*Sense plugins:*".to_string());
    let senses: BTreeSet<&str> = app.senses.iter().map(String::as_str).collect();
    lines.extend(senses.into_iter().map(|s| format!("  - {}", s)));

    lines.push("*Skill plugins:*".to_string());
    let skills: BTreeSet<&str> = app
        .registry
        .routes()
        .iter()
        .map(|route| route.destination().as_str())
        .collect();
    lines.extend(skills.into_iter().map(|s| format!("  - {}", s)));

    let probe = probe_storage(app).await?;
    lines.push("*Storage:*".to_string());
    lines.push(format!("  - *Test Result:* {}", if probe.ok { "Success" } else { "Error" }));
    lines.push(format!(
        "  - *Read time:* {:.6}s (cache: {:.6}s)",
        probe.store_read.as_secs_f64(),
        probe.cache_read.as_secs_f64()
    ));
    lines.push(format!(
        "  - *Write time:* {:.6}s (cache: {:.6}s)",
        probe.store_write.as_secs_f64(),
        probe.cache_write.as_secs_f64()
    ));
    lines.push(format!("  - *Key fingerprint:* {}", app.storage.current_fingerprint()));

    Ok(lines.join("\n"))
}

/// Built-in status report
pub struct DiagnosticsSkill;

#[async_trait]
impl Skill for DiagnosticsSkill {
    fn name(&self) -> &str {
        "diagnostics"
    }

    fn description(&self) -> &str {
        "Report on the bot's health"
    }

    fn routes(&self) -> Result<Vec<RouteSpec>, ValidationError> {
        Ok(vec![RouteSpec::pattern(r"(?i)^(?:diagnostics|status)$", "status")?.with_help(
            Help::usage("diagnostics|status", "Retrieve this bot's current status"),
        )])
    }

    async fn call(&self, ctx: &SkillContext, action: &str) -> Result<(), BotError> {
        match action {
            "status" => {
                tracing::debug!("Status requested, key {}", ctx.storage().current_fingerprint());
                ctx.reply(&status_report(&ctx.app).await?).await
            }
            other => Err(SkillError::UnknownAction {
                skill: self.name().to_string(),
                action: other.to_string(),
            }
            .into()),
        }
    }
}
