use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Errors that can occur when loading or persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Failed to serialize the configuration for writing.
    Serialize { source: serde_json::Error },
    /// Failed to write the config file back to disk.
    WriteFile { path: PathBuf, source: std::io::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Serialize { source } => {
                write!(f, "failed to serialize configuration: {}", source)
            }
            Self::WriteFile { path, source } => {
                write!(f, "failed to write config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Serialize { source } => Some(source),
            Self::WriteFile { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

/// Developer identity shown by the help surfaces and the health endpoint.
/// Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
    #[serde(default = "default_developer_name")]
    pub name: String,
    #[serde(default = "default_developer_handle")]
    pub telegram: String,
}

impl Default for Developer {
    fn default() -> Self {
        Self {
            name: default_developer_name(),
            telegram: default_developer_handle(),
        }
    }
}

fn default_developer_name() -> String {
    "operator".to_string()
}

fn default_developer_handle() -> String {
    "@operator".to_string()
}

fn default_host() -> String {
    "/".to_string()
}

fn default_text() -> String {
    "Hello! This is the configured default message.".to_string()
}

/// The configuration document. The file keys (`id`, `text`, ...) are kept
/// short for hand editing; field names here spell out what they mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default)]
    pub token: String,
    /// Default recipient id. May be empty, which disables default-send features.
    #[serde(rename = "id", default)]
    pub default_chat_id: String,
    /// Display-only host label.
    #[serde(default = "default_host")]
    pub host: String,
    /// Default message text, editable from the settings menu.
    #[serde(rename = "text", default = "default_text")]
    pub default_text: String,
    #[serde(default)]
    pub developer: Developer,
    /// Broadcast targets. When empty, broadcasts fall back to the default
    /// recipient id.
    #[serde(default)]
    pub broadcast_list: Vec<String>,
}

impl ConfigData {
    /// Resolve the recipients a broadcast goes to: the configured list, else
    /// the single default recipient, else nothing.
    pub fn broadcast_targets(&self) -> Vec<String> {
        if !self.broadcast_list.is_empty() {
            self.broadcast_list.clone()
        } else if !self.default_chat_id.is_empty() {
            vec![self.default_chat_id.clone()]
        } else {
            Vec::new()
        }
    }
}

/// The single source of truth for configuration. Mutations are committed only
/// once durably written; on a failed write the in-memory value is rolled back
/// so memory and disk never diverge.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<ConfigData>,
}

impl ConfigStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadFile { path: path.clone(), source: e })?;
        let data: ConfigData = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: path.clone(), source: e })?;

        if data.token.is_empty() {
            return Err(ConfigError::Validation(
                "\"token\" is required and must not be empty".into(),
            ));
        }

        Ok(Self { path, data: RwLock::new(data) })
    }

    /// Read access without cloning the whole document.
    pub fn read<R>(&self, f: impl FnOnce(&ConfigData) -> R) -> R {
        f(&self.data.read().expect("config lock poisoned"))
    }

    /// Apply a mutation and persist it. Writers serialize behind the write
    /// lock; the mutation is rolled back if the write fails.
    pub fn update(&self, mutate: impl FnOnce(&mut ConfigData)) -> Result<(), ConfigError> {
        let mut data = self.data.write().expect("config lock poisoned");
        let previous = data.clone();
        mutate(&mut data);
        if let Err(e) = persist(&self.path, &data) {
            *data = previous;
            return Err(e);
        }
        Ok(())
    }
}

fn persist(path: &Path, data: &ConfigData) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| ConfigError::Serialize { source: e })?;

    // Write-then-rename so a crash mid-write cannot truncate the live file.
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)
        .map_err(|e| ConfigError::WriteFile { path: tmp.clone(), source: e })?;
    std::fs::rename(&tmp, path)
        .map_err(|e| ConfigError::WriteFile { path: path.to_path_buf(), source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config() {
        let file = write_config(
            r#"{
            "token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
            "id": "111",
            "host": "example.org",
            "text": "hi",
            "developer": { "name": "Dev", "telegram": "@devhandle" },
            "broadcast_list": ["201", "202"]
        }"#,
        );
        let store = ConfigStore::load(file.path()).expect("should load valid config");
        store.read(|c| {
            assert_eq!(c.default_chat_id, "111");
            assert_eq!(c.host, "example.org");
            assert_eq!(c.default_text, "hi");
            assert_eq!(c.developer.telegram, "@devhandle");
            assert_eq!(c.broadcast_list, vec!["201", "202"]);
        });
    }

    #[test]
    fn test_defaults_applied() {
        let file = write_config(r#"{ "token": "123456789:ABCdef" }"#);
        let store = ConfigStore::load(file.path()).unwrap();
        store.read(|c| {
            assert_eq!(c.default_chat_id, "");
            assert_eq!(c.host, "/");
            assert!(!c.default_text.is_empty());
            assert_eq!(c.developer, Developer::default());
            assert!(c.broadcast_list.is_empty());
        });
    }

    #[test]
    fn test_missing_token() {
        let file = write_config(r#"{ "id": "111" }"#);
        let err = assert_err(ConfigStore::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{ "token": "" }"#);
        let err = assert_err(ConfigStore::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(ConfigStore::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(ConfigStore::load("/nonexistent/path/courier.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_update_round_trips_through_disk() {
        let file = write_config(r#"{ "token": "123456789:ABCdef", "id": "111" }"#);
        let store = ConfigStore::load(file.path()).unwrap();

        store.update(|c| c.default_chat_id = "999".into()).expect("update should persist");
        store.read(|c| assert_eq!(c.default_chat_id, "999"));

        // A fresh load sees the persisted value.
        let reloaded = ConfigStore::load(file.path()).unwrap();
        reloaded.read(|c| assert_eq!(c.default_chat_id, "999"));
    }

    #[test]
    fn test_update_preserves_unrelated_keys() {
        let file = write_config(
            r#"{
            "token": "123456789:ABCdef",
            "id": "111",
            "developer": { "name": "Dev", "telegram": "@devhandle" },
            "broadcast_list": ["201"]
        }"#,
        );
        let store = ConfigStore::load(file.path()).unwrap();
        store.update(|c| c.default_text = "new text".into()).unwrap();

        let reloaded = ConfigStore::load(file.path()).unwrap();
        reloaded.read(|c| {
            assert_eq!(c.default_chat_id, "111");
            assert_eq!(c.default_text, "new text");
            assert_eq!(c.developer.telegram, "@devhandle");
            assert_eq!(c.broadcast_list, vec!["201"]);
        });
    }

    #[test]
    fn test_failed_write_rolls_back_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("courier.json");
        std::fs::write(&path, r#"{ "token": "123456789:ABCdef", "id": "111" }"#).unwrap();
        let store = ConfigStore::load(&path).unwrap();

        // Remove the directory out from under the store so the write fails.
        drop(dir);

        let err = assert_err(store.update(|c| c.default_chat_id = "999".into()));
        assert!(matches!(err, ConfigError::WriteFile { .. }));
        store.read(|c| assert_eq!(c.default_chat_id, "111"));
    }

    #[test]
    fn test_broadcast_targets_prefers_list() {
        let file = write_config(
            r#"{ "token": "t:1", "id": "111", "broadcast_list": ["201", "202"] }"#,
        );
        let store = ConfigStore::load(file.path()).unwrap();
        store.read(|c| assert_eq!(c.broadcast_targets(), vec!["201", "202"]));
    }

    #[test]
    fn test_broadcast_targets_falls_back_to_default_id() {
        let file = write_config(r#"{ "token": "t:1", "id": "111" }"#);
        let store = ConfigStore::load(file.path()).unwrap();
        store.read(|c| assert_eq!(c.broadcast_targets(), vec!["111"]));
    }

    #[test]
    fn test_broadcast_targets_empty_when_nothing_configured() {
        let file = write_config(r#"{ "token": "t:1" }"#);
        let store = ConfigStore::load(file.path()).unwrap();
        store.read(|c| assert!(c.broadcast_targets().is_empty()));
    }
}
