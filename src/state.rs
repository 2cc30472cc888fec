use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::db::{SqliteStore, StoreHandle};
use crate::error::AppError;
use crate::migrations::run_migrations;
use crate::notification::{LogNotifier, Notifier};
use crate::services::{prompt_for_note, NotesStore, TemplatesStore};
use crate::transcription::{DictationSession, Recorder, SpeechToText};
use crate::types::Config;

/// Environment variable that overrides the database location.
pub const DB_PATH_ENV: &str = "CHARTNOTE_DB_PATH";

/// Application state shared by every caller of the core.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn StoreHandle>,
    pub notes: Arc<NotesStore>,
    pub templates: Arc<TemplatesStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Open the configured database and bring both stores up.
    pub async fn initialize(config: Config) -> Result<Self, AppError> {
        let env_override = std::env::var(DB_PATH_ENV).ok();
        let path = database_path(&config, env_override.as_deref())?;
        let store: Arc<dyn StoreHandle> = Arc::new(SqliteStore::at_path(path));
        Self::with_store(config, store, Arc::new(LogNotifier)).await
    }

    /// Run migrations and load both stores against `store`.
    ///
    /// Store failures are logged and the app continues with whatever loaded;
    /// an unreachable database yields empty stores rather than an error.
    pub async fn with_store(
        config: Config,
        store: Arc<dyn StoreHandle>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppError> {
        let runtime = current_runtime()?;

        match run_migrations(store.as_ref()).await {
            Ok(report) => log::info!(
                "Schema ready ({} statements, {} templates seeded)",
                report.statements_executed,
                report.templates_seeded
            ),
            Err(e) => log::error!("Migrations failed: {}", e),
        }

        let delay = Duration::from_millis(config.save_debounce_ms);
        let notes = Arc::new(NotesStore::new(Arc::clone(&store), delay, runtime.clone()));
        let templates = Arc::new(TemplatesStore::new(Arc::clone(&store), delay, runtime));

        if let Err(e) = notes.load().await {
            log::warn!("Starting with no notes: {}", e);
        }
        if let Err(e) = templates.load().await {
            log::warn!("Starting with no templates: {}", e);
        }

        Ok(Self {
            config,
            store,
            notes,
            templates,
            notifier,
        })
    }

    /// Compile the generation prompt for `note_id`, falling back to the
    /// configured default template.
    pub fn prompt_for_note(&self, note_id: &str) -> Result<String, AppError> {
        Ok(prompt_for_note(
            &self.notes,
            &self.templates,
            note_id,
            self.config.default_template_id.as_deref(),
        )?)
    }

    pub fn dictation(
        &self,
        recorder: Arc<dyn Recorder>,
        engine: Arc<dyn SpeechToText>,
    ) -> DictationSession {
        DictationSession::new(
            recorder,
            engine,
            Arc::clone(&self.notes),
            Arc::clone(&self.notifier),
            self.config.transcription_language.clone(),
        )
    }

    /// Write all pending edits. Call before exit.
    pub async fn shutdown(&self) -> usize {
        let written = self.notes.flush().await + self.templates.flush().await;
        log::info!("Shutdown: flushed {} pending saves", written);
        written
    }
}

/// Handle to the runtime the save timers are spawned on.
fn current_runtime() -> Result<Handle, AppError> {
    Handle::try_current().map_err(|e| AppError::Runtime(e.to_string()))
}

/// `~/.chartnote/config.json`
pub fn config_path() -> Result<PathBuf, AppError> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".chartnote").join("config.json"))
}

/// Load the config from its default location. A missing file yields defaults.
pub fn load_config() -> Result<Config, AppError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config, AppError> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read config: {}", e)))?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
}

/// Write `config` to `path` atomically (temp file, then rename).
pub fn save_config_to(path: &Path, config: &Config) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)
        .map_err(|e| AppError::Config(format!("Failed to write config: {}", e)))?;
    fs::rename(&tmp_path, path)
        .map_err(|e| AppError::Config(format!("Failed to write config: {}", e)))?;
    Ok(())
}

/// Load the config at its default location, apply `mutate`, and write it back.
pub fn update_config(mutate: impl FnOnce(&mut Config)) -> Result<Config, AppError> {
    update_config_at(&config_path()?, mutate)
}

pub fn update_config_at(path: &Path, mutate: impl FnOnce(&mut Config)) -> Result<Config, AppError> {
    let mut config = load_config_from(path)?;
    mutate(&mut config);
    save_config_to(path, &config)?;
    Ok(config)
}

/// Database location: `env_override`, then `config.database_path`, then
/// `~/.chartnote/chartnote.db`. Blank values are ignored.
pub fn database_path(config: &Config, env_override: Option<&str>) -> Result<PathBuf, AppError> {
    let explicit = env_override
        .into_iter()
        .chain(config.database_path.as_deref())
        .map(str::trim)
        .find(|p| !p.is_empty());

    match explicit {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(SqliteStore::default_path()?),
    }
}
