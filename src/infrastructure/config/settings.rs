use serde_json::Value;
use std::collections::BTreeMap;

/// Prefix of environment variables that feed settings
pub const ENV_PREFIX: &str = "CONF_";

/// Keys under this namespace are accepted without a declared schema
pub const GLOBAL_NAMESPACE: &str = "global.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Boolean,
    Integer,
}

impl ValueKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
        }
    }

    /// Environment values arrive as text
    fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            ValueKind::String => Some(Value::String(raw.to_string())),
            ValueKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(Value::Bool(true)),
                "false" | "no" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueKind::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
        }
    }
}

/// A setting a component declares before the settings are built
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub key: String,
    pub kind: ValueKind,
    pub default: Option<Value>,
    pub required: bool,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ValueKind::String,
            default: None,
            required: false,
        }
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Collects a schema and raw values, then freezes them into [`Settings`].
///
/// Values may arrive before the key is declared (the file is read before
/// skills register), so undeclared values are held back and checked at
/// `build` time.
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    schema: BTreeMap<String, ConfigEntry>,
    values: BTreeMap<String, Value>,
    pending: BTreeMap<String, PendingValue>,
}

#[derive(Debug, Clone)]
enum PendingValue {
    Typed(Value),
    Text(String),
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, entry: ConfigEntry) -> &mut Self {
        self.schema.insert(entry.key.clone(), entry);
        self
    }

    pub fn declare_all(&mut self, entries: impl IntoIterator<Item = ConfigEntry>) -> &mut Self {
        for entry in entries {
            self.declare(entry);
        }
        self
    }

    /// Set a typed value. Returns false when it was rejected.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        if key.starts_with(GLOBAL_NAMESPACE) && !self.schema.contains_key(key) {
            self.values.insert(key.to_string(), value);
            return true;
        }

        match self.schema.get(key) {
            Some(entry) if entry.kind.accepts(&value) => {
                self.values.insert(key.to_string(), value);
                true
            }
            Some(entry) => {
                tracing::warn!("Ignoring {}: expected {:?}, got {}", key, entry.kind, value);
                false
            }
            None => {
                tracing::warn!("Ignoring unknown setting: {}", key);
                false
            }
        }
    }

    /// Set a value given as text, converting it to the declared kind
    pub fn set_text(&mut self, key: &str, raw: &str) -> bool {
        if key.starts_with(GLOBAL_NAMESPACE) && !self.schema.contains_key(key) {
            return self.set(key, Value::String(raw.to_string()));
        }

        let Some(kind) = self.schema.get(key).map(|entry| entry.kind) else {
            tracing::warn!("Ignoring unknown setting: {}", key);
            return false;
        };

        match kind.coerce(raw) {
            Some(value) => self.set(key, value),
            None => {
                tracing::warn!("Ignoring {}: '{}' is not a valid {:?}", key, raw, kind);
                false
            }
        }
    }

    /// Read `CONF_*` variables: `CONF_SKILLS_FUN_GREETING` sets `skills.fun.greeting`
    pub fn load_env(&mut self) -> &mut Self {
        self.load_vars(std::env::vars())
    }

    pub fn load_vars<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in vars {
            if let Some(key) = env_key(name.as_ref()) {
                self.pending.insert(key, PendingValue::Text(value.as_ref().to_string()));
            }
        }
        self
    }

    /// Hold YAML values until the schema is complete
    pub fn defer_yaml(&mut self, values: &BTreeMap<String, serde_yaml::Value>) -> &mut Self {
        for (key, value) in values {
            match serde_json::to_value(value) {
                Ok(value) => {
                    self.pending.insert(key.clone(), PendingValue::Typed(value));
                }
                Err(e) => tracing::warn!("Ignoring {}: {}", key, e),
            }
        }
        self
    }

    pub fn build(mut self) -> Settings {
        let pending = std::mem::take(&mut self.pending);
        for (key, value) in pending {
            match value {
                PendingValue::Typed(value) => self.set(&key, value),
                PendingValue::Text(raw) => self.set_text(&key, &raw),
            };
        }

        Settings {
            schema: self.schema,
            values: self.values,
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    let rest = name.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_ascii_lowercase().split('_').collect::<Vec<_>>().join("."))
}

/// Immutable, namespaced configuration snapshot shared by every component
#[derive(Debug, Clone, Default)]
pub struct Settings {
    schema: BTreeMap<String, ConfigEntry>,
    values: BTreeMap<String, Value>,
}

impl Settings {
    /// Explicit value, falling back to the declared default
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values
            .get(key)
            .or_else(|| self.schema.get(key).and_then(|entry| entry.default.as_ref()))
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str()).map(str::to_string)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn is_declared(&self, key: &str) -> bool {
        self.schema.contains_key(key)
    }

    /// Required keys under `namespace` with neither a value nor a default
    pub fn missing(&self, namespace: &str) -> Vec<String> {
        let prefix = format!("{}.", namespace.trim_end_matches('.'));
        self.schema
            .values()
            .filter(|entry| entry.required && entry.key.starts_with(&prefix))
            .filter(|entry| self.get(&entry.key).is_none())
            .map(|entry| entry.key.clone())
            .collect()
    }

    pub fn is_configured(&self, namespace: &str) -> bool {
        let missing = self.missing(namespace);
        for key in &missing {
            tracing::error!("Missing required setting: {}", key);
        }
        missing.is_empty()
    }

    /// Global admin emails, lowercased
    pub fn admins(&self) -> Vec<String> {
        self.get_str("global.admins")
            .map(|raw| {
                super::split_list(&raw)
                    .into_iter()
                    .map(|email| email.to_lowercase())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn log_level(&self) -> String {
        self.get_str("global.log.level").unwrap_or_else(|| "info".to_string())
    }

    pub fn bot_name(&self) -> String {
        self.get_str("global.bot.name").unwrap_or_else(|| "skillgate".to_string())
    }
}
