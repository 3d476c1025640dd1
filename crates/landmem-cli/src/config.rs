//! Configuration for the landmem CLI.
//!
//! Provides the [`LandmemConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `LANDMEM_CONFIG` environment variable
//! 3. XDG default: `~/.config/landmem/config.toml`
//! 4. Built-in defaults

use std::path::PathBuf;

use confyg::{Confygery, env};
use landmem_core::traits::{ConfigProvider, DEFAULT_COLLECTION};
use landmem_core::{Error, Result};
use landmem_search::{DEFAULT_MATCH_COUNT, DEFAULT_SIMILARITY_THRESHOLD, ResultOrdering};
use landmem_vector::{EmbeddingConfig, StoreConfig};
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the landmem CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmemConfig {
    /// Project name, used for default paths.
    pub project_name: String,

    /// The one collection this deployment reads and writes.
    pub collection: String,

    /// Base directory for store data. Defaults to the XDG data directory.
    pub data_path: Option<String>,

    /// Plot store configuration.
    pub store: StoreConfig,

    /// Embedding provider configuration.
    pub embedding: EmbeddingConfig,

    /// Search defaults.
    pub search: SearchConfig,
}

/// Search defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum similarity for a candidate.
    pub similarity_threshold: f32,

    /// Default number of results.
    pub match_count: usize,

    /// Order of filtered results: "filter" or "similarity".
    pub ordering: String,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for LandmemConfig {
    fn default() -> Self {
        Self {
            project_name: "landmem".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            data_path: None,
            store: StoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            match_count: DEFAULT_MATCH_COUNT,
            ordering: ResultOrdering::default().to_string(),
        }
    }
}

impl SearchConfig {
    /// The configured ordering.
    pub fn ordering(&self) -> Result<ResultOrdering> {
        self.ordering.parse()
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl LandmemConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("LANDMEM");
        env_opts.add_section("store");
        env_opts.add_section("embedding");
        env_opts.add_section("search");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;
        log::debug!("Loaded configuration for collection '{}'", config.collection);

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("LANDMEM_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("landmem").join("config.toml"))
    }

    /// The store configuration with its path defaulted under the data path.
    ///
    /// The memory store would otherwise forget everything between runs.
    pub fn resolved_store(&self) -> Result<StoreConfig> {
        let mut store = self.store.clone();
        if store.path.is_none() {
            let dir = self.data_path()?.join(&store.backend);
            store.path = Some(dir.to_string_lossy().into_owned());
        }
        Ok(store)
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `LANDMEM_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "LANDMEM", &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for LandmemConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn data_path(&self) -> Result<PathBuf> {
        match &self.data_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => dirs::data_dir()
                .map(|d| d.join(&self.project_name))
                .ok_or_else(|| Error::config("Could not determine data directory")),
        }
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                flatten_toml_value(val, &format!("{}_{}", prefix, key.to_uppercase()), out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// RAII guard for env var manipulation in tests.
    struct EnvGuard {
        key: String,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn new(key: &str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: tests touching the environment use distinct keys.
            unsafe { std::env::set_var(key, value) };
            Self {
                key: key.to_string(),
                prev,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // SAFETY: see EnvGuard::new.
            unsafe {
                match &self.prev {
                    Some(val) => std::env::set_var(&self.key, val),
                    None => std::env::remove_var(&self.key),
                }
            }
        }
    }

    #[test]
    fn test_landmem_config_default() {
        let config = LandmemConfig::default();
        assert_eq!(config.project_name, "landmem");
        assert_eq!(config.collection, "land_memories");
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.embedding.provider, "mock");
        assert_eq!(config.search.similarity_threshold, 0.75);
        assert_eq!(config.search.match_count, 20);
        assert_eq!(config.search.ordering().unwrap(), ResultOrdering::FilterOrder);
    }

    #[test]
    fn test_landmem_config_from_toml() {
        let toml_str = r#"
            collection = "harbor_plots"
            data_path = "/data/landmem"

            [store]
            backend = "lancedb"
            path = "/data/lance"

            [embedding]
            provider = "fastembed"
            model = "all-minilm-l6-v2"

            [search]
            similarity_threshold = 0.6
            match_count = 5
            ordering = "similarity"
        "#;

        let config: LandmemConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.collection(), "harbor_plots");
        assert_eq!(config.store.backend, "lancedb");
        assert_eq!(config.store.path.as_deref(), Some("/data/lance"));
        assert_eq!(config.embedding.model, "all-minilm-l6-v2");
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.search.match_count, 5);
        assert_eq!(
            config.search.ordering().unwrap(),
            ResultOrdering::SimilarityRank
        );
        assert_eq!(config.data_path().unwrap(), PathBuf::from("/data/landmem"));
    }

    #[test]
    fn test_landmem_config_toml_round_trip() {
        let config = LandmemConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("[search]"));
        assert!(toml_str.contains("match_count = 20"));

        let parsed: LandmemConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_landmem_config_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                collection = "loaded_plots"
                [search]
                match_count = 7
            "#,
        )
        .unwrap();

        let config = LandmemConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.collection, "loaded_plots");
        assert_eq!(config.search.match_count, 7);
    }

    #[test]
    fn test_landmem_config_load_missing_file_uses_defaults() {
        let config = LandmemConfig::load(Some("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.collection, "land_memories");
    }

    #[test]
    fn test_landmem_config_load_env_overlay() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[embedding]\nmodel = \"bge-small-en-v1.5\"\n").unwrap();

        // confyg passes env values as strings, so overlay a string field.
        let _guard = EnvGuard::new("LANDMEM_EMBEDDING_MODEL", "bge-base-en-v1.5");
        let config = LandmemConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.embedding.model, "bge-base-en-v1.5");
    }

    #[test]
    fn test_resolve_config_path_explicit() {
        assert_eq!(
            LandmemConfig::resolve_config_path(Some("/explicit/config.toml")),
            Some(PathBuf::from("/explicit/config.toml"))
        );
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = LandmemConfig::default_config_path() {
            assert!(path.ends_with("landmem/config.toml"));
        }
    }

    #[test]
    fn test_resolved_store_defaults_under_data_path() {
        let config = LandmemConfig {
            data_path: Some("/srv/landmem".into()),
            ..Default::default()
        };
        let store = config.resolved_store().unwrap();
        assert_eq!(store.path.as_deref(), Some("/srv/landmem/memory"));

        let explicit = LandmemConfig {
            store: StoreConfig {
                path: Some("/elsewhere".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            explicit.resolved_store().unwrap().path.as_deref(),
            Some("/elsewhere")
        );
    }

    #[test]
    fn test_landmem_config_to_env_vars() {
        let vars = LandmemConfig::default().to_env_vars().unwrap();
        let map: HashMap<_, _> = vars.into_iter().collect();
        assert_eq!(map.get("LANDMEM_COLLECTION").unwrap(), "land_memories");
        assert_eq!(map.get("LANDMEM_STORE_BACKEND").unwrap(), "memory");
        assert_eq!(map.get("LANDMEM_SEARCH_MATCH_COUNT").unwrap(), "20");
    }

    #[test]
    fn test_landmem_config_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LandmemConfig>();
    }
}
