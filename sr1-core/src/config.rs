use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Fallback when the embedded file omits a key.
const DEFAULT_CONTEXT: &str = "default";
const DEFAULT_DEBOUNCE_MS: u64 = 2000;
const DEFAULT_INITIAL_URL: &str = "http://localhost/";

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    app: AppConfig,
    #[serde(default)]
    history: HistoryConfig,
    #[serde(default)]
    storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct AppConfig {
    context: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct HistoryConfig {
    debounce_ms: Option<u64>,
    initial_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct StorageConfig {
    directory: Option<PathBuf>,
}

/// Runtime settings: the store's context key, the history debounce window,
/// the in-memory history's start location, and the file storage directory.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    history: HistoryConfig,
    storage: StorageConfig,
}

impl Config {
    /// Embedded defaults merged with `<config_dir>/sr1/config.toml`, if any.
    pub fn load() -> Self {
        match user_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Embedded defaults merged with the file at `path`.
    ///
    /// A missing file is not an error. An unreadable or malformed file is
    /// logged and ignored.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Self::default();
        if !path.exists() {
            return config;
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                Ok(user) => config.merge(user),
                Err(e) => {
                    log::warn!(
                        target: "config",
                        "ignoring malformed config {}: {}",
                        path.display(),
                        e
                    )
                }
            },
            Err(e) => {
                log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
            }
        }
        config
    }

    /// Embedded defaults merged with TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let user: ConfigFile = toml::from_str(text)?;
        let mut config = Self::default();
        config.merge(user);
        Ok(config)
    }

    fn merge(&mut self, user: ConfigFile) {
        if user.app.context.is_some() {
            self.app.context = user.app.context;
        }
        if user.history.debounce_ms.is_some() {
            self.history.debounce_ms = user.history.debounce_ms;
        }
        if user.history.initial_url.is_some() {
            self.history.initial_url = user.history.initial_url;
        }
        if user.storage.directory.is_some() {
            self.storage.directory = user.storage.directory;
        }
    }

    /// Storage key the Store is persisted under.
    pub fn context(&self) -> &str {
        self.app
            .context
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONTEXT)
    }

    /// Window within which successive route writes replace instead of push.
    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    pub fn initial_url(&self) -> &str {
        self.history
            .initial_url
            .as_deref()
            .unwrap_or(DEFAULT_INITIAL_URL)
    }

    /// Directory used by [`FileStorage`](crate::storage::FileStorage).
    pub fn storage_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.directory {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("sr1"))
            .unwrap_or_else(|| PathBuf::from(".sr1"))
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.app.context = Some(context.into());
        self
    }

    pub fn with_history_debounce(mut self, window: Duration) -> Self {
        self.history.debounce_ms = Some(window.as_millis() as u64);
        self
    }

    pub fn with_initial_url(mut self, url: impl Into<String>) -> Self {
        self.history.initial_url = Some(url.into());
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.directory = Some(dir.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");
        Config {
            app: base.app,
            history: base.history,
            storage: base.storage,
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sr1").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults() {
        let config = Config::default();
        assert_eq!(config.context(), "default");
        assert_eq!(config.history_debounce(), Duration::from_millis(2000));
        assert_eq!(config.initial_url(), "http://localhost/");
    }

    #[test]
    fn user_text_overrides_only_given_keys() {
        let config = Config::from_toml_str("[history]\ndebounce_ms = 250\n").unwrap();
        assert_eq!(config.history_debounce(), Duration::from_millis(250));
        assert_eq!(config.context(), "default");
        assert_eq!(config.initial_url(), "http://localhost/");
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(Config::from_toml_str("[history\n").is_err());
    }

    #[test]
    fn empty_context_falls_back() {
        let config = Config::default().with_context("");
        assert_eq!(config.context(), "default");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[app]\ncontext = \"todo\"\n[storage]\ndirectory = \"/tmp/sr1-test\"\n",
        )
        .unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.context(), "todo");
        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/sr1-test"));
    }

    #[test]
    fn load_from_ignores_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.context(), "default");
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config.history_debounce(), Duration::from_millis(2000));
    }

    #[test]
    fn builder_setters() {
        let config = Config::default()
            .with_context("tab")
            .with_history_debounce(Duration::from_millis(10))
            .with_initial_url("http://localhost:1948/")
            .with_storage_dir("/data");
        assert_eq!(config.context(), "tab");
        assert_eq!(config.history_debounce(), Duration::from_millis(10));
        assert_eq!(config.initial_url(), "http://localhost:1948/");
        assert_eq!(config.storage_dir(), PathBuf::from("/data"));
    }
}
