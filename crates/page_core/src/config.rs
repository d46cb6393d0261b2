use std::{fs, path::Path, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use storage::{
    firestore::DEFAULT_FIRESTORE_BASE_URL, normalize_database_url, DisabledStore, DocumentStore,
    FirestoreClient, FirestoreConfig, MemoryStore, PersistenceClient,
};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "landing.toml";
pub const DEFAULT_HANDOFF_DELAY: Duration = Duration::from_millis(600);
pub const DEFAULT_ERROR_CLEAR_DELAY: Duration = Duration::from_millis(500);

/// Fixed delays of the page's animated handoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Fade between hiding the old panel and revealing the new one.
    pub handoff: Duration,
    /// How long the capture field keeps its error marker.
    pub error_clear: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            handoff: DEFAULT_HANDOFF_DELAY,
            error_clear: DEFAULT_ERROR_CLEAR_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceBackend {
    #[default]
    Disabled,
    Memory,
    Sqlite,
    Firestore,
}

impl PersistenceBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "off" => Some(Self::Disabled),
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            "firestore" | "firebase" => Some(Self::Firestore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub persistence: PersistenceBackend,
    pub database_url: String,
    pub firestore_base_url: String,
    pub firestore_project_id: Option<String>,
    pub firestore_api_key: Option<String>,
    pub handoff_delay_ms: u64,
    pub error_clear_ms: u64,
    pub scene_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            persistence: PersistenceBackend::Disabled,
            database_url: "sqlite://./data/landing.db".into(),
            firestore_base_url: DEFAULT_FIRESTORE_BASE_URL.into(),
            firestore_project_id: None,
            firestore_api_key: None,
            handoff_delay_ms: DEFAULT_HANDOFF_DELAY.as_millis() as u64,
            error_clear_ms: DEFAULT_ERROR_CLEAR_DELAY.as_millis() as u64,
            scene_enabled: true,
        }
    }
}

impl Settings {
    pub fn timings(&self) -> Timings {
        Timings {
            handoff: Duration::from_millis(self.handoff_delay_ms),
            error_clear: Duration::from_millis(self.error_clear_ms),
        }
    }
}

/// Defaults, then `landing.toml` in the working directory, then the environment.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_CONFIG_PATH))
}

pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<toml::Table>(&raw) {
            Ok(table) => apply_file(&mut settings, &table),
            Err(err) => warn!(path = %path.display(), "ignoring unparsable config file: {err}"),
        }
    }

    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, table: &toml::Table) {
    let text = |key: &str| match table.get(key) {
        Some(toml::Value::String(v)) => Some(v.clone()),
        Some(toml::Value::Integer(v)) => Some(v.to_string()),
        Some(toml::Value::Boolean(v)) => Some(v.to_string()),
        _ => None,
    };

    apply_value(settings, "persistence", text("persistence"));
    apply_value(settings, "database_url", text("database_url"));
    apply_value(settings, "firestore_base_url", text("firestore_base_url"));
    apply_value(settings, "firestore_project_id", text("firestore_project_id"));
    apply_value(settings, "firestore_api_key", text("firestore_api_key"));
    apply_value(settings, "handoff_delay_ms", text("handoff_delay_ms"));
    apply_value(settings, "error_clear_ms", text("error_clear_ms"));
    apply_value(settings, "scene_enabled", text("scene_enabled"));
}

/// Environment layer; `APP__*` names win over the `LANDING_*` ones.
pub fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    const KEYS: [(&str, &str, &str); 8] = [
        ("persistence", "LANDING_PERSISTENCE", "APP__PERSISTENCE"),
        ("database_url", "DATABASE_URL", "APP__DATABASE_URL"),
        ("firestore_base_url", "FIRESTORE_BASE_URL", "APP__FIRESTORE_BASE_URL"),
        ("firestore_project_id", "FIRESTORE_PROJECT_ID", "APP__FIRESTORE_PROJECT_ID"),
        ("firestore_api_key", "FIRESTORE_API_KEY", "APP__FIRESTORE_API_KEY"),
        ("handoff_delay_ms", "LANDING_HANDOFF_DELAY_MS", "APP__HANDOFF_DELAY_MS"),
        ("error_clear_ms", "LANDING_ERROR_CLEAR_MS", "APP__ERROR_CLEAR_MS"),
        ("scene_enabled", "LANDING_SCENE_ENABLED", "APP__SCENE_ENABLED"),
    ];

    for (key, plain, prefixed) in KEYS {
        apply_value(settings, key, lookup(plain));
        apply_value(settings, key, lookup(prefixed));
    }
}

fn apply_value(settings: &mut Settings, key: &str, value: Option<String>) {
    let Some(value) = value else {
        return;
    };
    let value = value.trim().to_string();

    match key {
        "persistence" => match PersistenceBackend::parse(&value) {
            Some(backend) => settings.persistence = backend,
            None => warn!(%value, "unknown persistence backend; keeping {:?}", settings.persistence),
        },
        "database_url" => settings.database_url = value,
        "firestore_base_url" => settings.firestore_base_url = value,
        "firestore_project_id" => settings.firestore_project_id = non_empty(value),
        "firestore_api_key" => settings.firestore_api_key = non_empty(value),
        "handoff_delay_ms" => {
            if let Ok(parsed) = value.parse() {
                settings.handoff_delay_ms = parsed;
            }
        }
        "error_clear_ms" => {
            if let Ok(parsed) = value.parse() {
                settings.error_clear_ms = parsed;
            }
        }
        "scene_enabled" => {
            if let Some(flag) = parse_flag(&value) {
                settings.scene_enabled = flag;
            }
        }
        _ => {}
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Opens the document store selected by `settings`.
pub async fn build_persistence(settings: &Settings) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    let client: Arc<dyn PersistenceClient> = match settings.persistence {
        PersistenceBackend::Disabled => Arc::new(DisabledStore),
        PersistenceBackend::Memory => Arc::new(MemoryStore::new()),
        PersistenceBackend::Sqlite => {
            let database_url = normalize_database_url(&settings.database_url);
            let store = DocumentStore::new(&database_url)
                .await
                .with_context(|| format!("failed to open document store at '{database_url}'"))?;
            Arc::new(store)
        }
        PersistenceBackend::Firestore => {
            let project_id = settings
                .firestore_project_id
                .clone()
                .ok_or_else(|| anyhow!("firestore backend selected without a project id"))?;
            Arc::new(FirestoreClient::new(FirestoreConfig {
                base_url: settings.firestore_base_url.clone(),
                api_key: settings.firestore_api_key.clone(),
                ..FirestoreConfig::new(project_id)
            })?)
        }
    };

    info!(backend = client.backend_name(), "store: backend ready");
    Ok(client)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
