use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{FormPilotError, Result};
use crate::mapping::mapping_model::Profile;

pub const PROFILE_KEY: &str = "profile";
pub const CONTEXT_KEY: &str = "context";
pub const API_BASE_URL_KEY: &str = "apiBaseUrl";

/// Persisted string key-value storage (the extension's local storage).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, used by tests and one-off runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// JSON-object file on disk, rewritten on every write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| FormPilotError::JsonParse {
                context: format!("store file {}", self.path.display()),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(FormPilotError::Io {
                context: format!("reading store file {}", self.path.display()),
                source: e,
            }),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| FormPilotError::Io {
                context: format!("creating store directory {}", dir.display()),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(values).map_err(|e| {
            FormPilotError::JsonSerialize {
                context: "store file".into(),
                source: e,
            }
        })?;
        std::fs::write(&self.path, json).map_err(|e| FormPilotError::Io {
            context: format!("writing store file {}", self.path.display()),
            source: e,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

/// Typed view over a `KeyValueStore`: Profile, Context and the service base
/// URL.
///
/// Loads never fail: an unreadable or corrupt entry is logged and treated as
/// empty, because the pipeline reads the store at the start of every
/// resolution. Saves propagate errors to the user action that triggered
/// them.
pub struct LocalStore {
    inner: Box<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(inner: Box<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileStore::new(path)))
    }

    fn load_raw(&self, key: &str) -> Option<String> {
        match self.inner.get(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "store read failed; using empty value");
                None
            }
        }
    }

    pub fn load_profile(&self) -> Profile {
        let Some(raw) = self.load_raw(PROFILE_KEY) else {
            return Profile::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored profile is not valid JSON; using empty profile");
            Profile::new()
        })
    }

    pub fn load_context(&self) -> String {
        self.load_raw(CONTEXT_KEY).unwrap_or_default()
    }

    pub fn load_api_base_url(&self) -> Option<String> {
        self.load_raw(API_BASE_URL_KEY)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
    }

    pub fn save_profile(&mut self, profile: &Profile) -> Result<()> {
        let json = serde_json::to_string(profile).map_err(|e| FormPilotError::JsonSerialize {
            context: "profile".into(),
            source: e,
        })?;
        self.inner.set(PROFILE_KEY, &json)
    }

    pub fn save_context(&mut self, context: &str) -> Result<()> {
        self.inner.set(CONTEXT_KEY, context)
    }

    pub fn save_api_base_url(&mut self, url: &str) -> Result<()> {
        self.inner.set(API_BASE_URL_KEY, url.trim())
    }
}
