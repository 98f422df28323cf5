//! Key-value settings store.
//!
//! The importer never reaches for a global store: callers hand the pipeline a
//! [`ConfigStore`]. [`JsonFileStore`] keeps every key in one JSON object on disk;
//! [`MemoryStore`] backs tests.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{PodficError, Result};
use crate::settings::{ImportSettings, NotesTemplate, TemplateSet, TemplateSlot};
use crate::types::ImportOptions;

/// Store keys read by the importer.
pub mod keys {
    pub const OPTIONS: &str = "options";
    pub const WORKBODY: &str = "workbody";
    pub const TITLE_TEMPLATE: &str = "title_template";
    pub const SUMMARY_TEMPLATE: &str = "summary_template";
    pub const NOTES_TEMPLATE: &str = "notes_template";
}

/// Asynchronous key/value storage for user settings.
pub trait ConfigStore: Send + Sync {
    /// Read a key; `None` when it was never set.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Write a key, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated from a JSON object.
    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    /// Snapshot of every key.
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.values.lock().await.clone()
    }
}

impl ConfigStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as a single JSON object file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles from this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole object; a missing file is an empty store.
    pub async fn read_all(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "store file not found, treating as empty");
                return Ok(Map::new());
            }
            Err(e) => return Err(PodficError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PodficError::config(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(PodficError::config(format!(
                "failed to parse {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PodficError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| PodficError::config(format!("failed to serialize store: {e}")))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| PodficError::io(&self.path, e))
    }
}

impl ConfigStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        self.write_all(&map).await
    }
}

// ---------------------------------------------------------------------------
// Typed access
// ---------------------------------------------------------------------------

/// Read and decode one key. Missing and `null` values are `None`.
pub async fn get_typed<T: DeserializeOwned>(
    store: &impl ConfigStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| PodficError::config(format!("invalid value for '{key}': {e}"))),
    }
}

/// Encode and write one key.
pub async fn set_typed<T: Serialize>(store: &impl ConfigStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .map_err(|e| PodficError::config(format!("failed to encode '{key}': {e}")))?;
    store.set(key, value).await
}

/// Read the options and templates for one import, filling gaps with defaults.
pub async fn load_import_settings(store: &impl ConfigStore) -> Result<ImportSettings> {
    let defaults = TemplateSet::default();

    let options: ImportOptions = get_typed(store, keys::OPTIONS).await?.unwrap_or_default();
    let workbody: TemplateSlot = get_typed(store, keys::WORKBODY)
        .await?
        .unwrap_or(defaults.workbody);
    let title: TemplateSlot = get_typed(store, keys::TITLE_TEMPLATE)
        .await?
        .unwrap_or(defaults.title);
    let summary: TemplateSlot = get_typed(store, keys::SUMMARY_TEMPLATE)
        .await?
        .unwrap_or(defaults.summary);
    let notes: NotesTemplate = get_typed(store, keys::NOTES_TEMPLATE)
        .await?
        .unwrap_or(defaults.notes);

    Ok(ImportSettings {
        options,
        templates: TemplateSet {
            workbody,
            title,
            summary,
            notes,
        },
    })
}

/// Seed missing keys with defaults and migrate legacy option flags.
///
/// `transform_title` / `transform_summary` booleans become `title_format` /
/// `summary_format` (`true` → `default`, `false` → `orig`) and are removed.
pub async fn setup_storage(store: &impl ConfigStore) -> Result<()> {
    let stored = store.get(keys::OPTIONS).await?;

    let mut options = match serde_json::to_value(ImportOptions::default()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if let Some(Value::Object(existing)) = &stored {
        for (k, v) in existing {
            options.insert(k.clone(), v.clone());
        }
    }

    for (legacy, current) in [
        ("transform_title", "title_format"),
        ("transform_summary", "summary_format"),
    ] {
        if let Some(flag) = options.remove(legacy) {
            let format = if flag.as_bool().unwrap_or(false) {
                "default"
            } else {
                "orig"
            };
            info!(legacy, format, "migrating legacy option");
            options.insert(current.to_string(), Value::String(format.to_string()));
        }
    }

    let options = Value::Object(options);
    if stored.as_ref() != Some(&options) {
        store.set(keys::OPTIONS, options).await?;
    }

    let defaults = TemplateSet::default();
    if store.get(keys::WORKBODY).await?.is_none() {
        set_typed(store, keys::WORKBODY, &defaults.workbody).await?;
    }
    if store.get(keys::TITLE_TEMPLATE).await?.is_none() {
        set_typed(store, keys::TITLE_TEMPLATE, &defaults.title).await?;
    }
    if store.get(keys::SUMMARY_TEMPLATE).await?.is_none() {
        set_typed(store, keys::SUMMARY_TEMPLATE, &defaults.summary).await?;
    }
    if store.get(keys::NOTES_TEMPLATE).await?.is_none() {
        set_typed(store, keys::NOTES_TEMPLATE, &defaults.notes).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DEFAULT_SUMMARY_TEMPLATE, DEFAULT_TITLE_TEMPLATE};
    use crate::types::TemplateFormat;
    use serde_json::json;

    #[tokio::test]
    async fn empty_store_loads_defaults() {
        let store = MemoryStore::new();
        let settings = load_import_settings(&store).await.unwrap();
        assert_eq!(settings, ImportSettings::default());
        assert_eq!(settings.templates.title.default, DEFAULT_TITLE_TEMPLATE);
    }

    #[tokio::test]
    async fn stored_values_override_defaults() {
        let store = MemoryStore::new();
        store
            .set(keys::OPTIONS, json!({"url": "https://archiveofourown.org/works/1", "title_format": "blank"}))
            .await
            .unwrap();
        store
            .set(keys::NOTES_TEMPLATE, json!({"default": "notes", "begin": true, "end": false}))
            .await
            .unwrap();

        let settings = load_import_settings(&store).await.unwrap();
        assert_eq!(settings.options.url, "https://archiveofourown.org/works/1");
        assert_eq!(settings.options.title_format, TemplateFormat::Blank);
        assert!(settings.templates.notes.begin);
        assert_eq!(settings.templates.summary.default, DEFAULT_SUMMARY_TEMPLATE);
    }

    #[tokio::test]
    async fn invalid_value_is_config_error() {
        let store = MemoryStore::new();
        store.set(keys::TITLE_TEMPLATE, json!(42)).await.unwrap();
        let err = load_import_settings(&store).await.unwrap_err();
        assert!(err.to_string().contains("title_template"));
    }

    #[tokio::test]
    async fn setup_seeds_every_key() {
        let store = MemoryStore::new();
        setup_storage(&store).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot["options"]["podfic_length_value"], "0-10 Minutes");
        assert_eq!(snapshot["options"]["title_format"], "default");
        assert_eq!(snapshot["title_template"]["default"], DEFAULT_TITLE_TEMPLATE);
        assert_eq!(snapshot["notes_template"], json!({"default": "", "begin": false, "end": false}));
        assert!(snapshot["workbody"]["default"].as_str().unwrap().contains("<audio"));
    }

    #[tokio::test]
    async fn setup_migrates_legacy_flags() {
        let store = MemoryStore::new();
        store
            .set(keys::OPTIONS, json!({"transform_title": false, "transform_summary": true}))
            .await
            .unwrap();

        setup_storage(&store).await.unwrap();

        let options = store.get(keys::OPTIONS).await.unwrap().unwrap();
        assert_eq!(options["title_format"], "orig");
        assert_eq!(options["summary_format"], "default");
        assert!(options.get("transform_title").is_none());
        assert!(options.get("transform_summary").is_none());
    }

    #[tokio::test]
    async fn setup_keeps_existing_templates() {
        let store = MemoryStore::new();
        store
            .set(keys::TITLE_TEMPLATE, json!({"default": "${title} (audio)"}))
            .await
            .unwrap();
        setup_storage(&store).await.unwrap();
        let title: TemplateSlot = get_typed(&store, keys::TITLE_TEMPLATE).await.unwrap().unwrap();
        assert_eq!(title.default, "${title} (audio)");
    }

    #[tokio::test]
    async fn json_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("podfic-store-test-{}", uuid::Uuid::now_v7()));
        let store = JsonFileStore::new(dir.join("store.json"));

        assert!(store.get(keys::OPTIONS).await.unwrap().is_none());
        store.set("workbody", json!({"default": "body"})).await.unwrap();
        store.set("title_template", json!({"default": "t"})).await.unwrap();

        let reopened = JsonFileStore::new(dir.join("store.json"));
        assert_eq!(reopened.get("workbody").await.unwrap(), Some(json!({"default": "body"})));
        assert_eq!(reopened.read_all().await.unwrap().len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
