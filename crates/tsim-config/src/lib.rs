//! tsim-config
//!
//! Layered YAML configuration. Documents merge in order (later overrides
//! earlier, objects merge deep), and the effective config is hashed over
//! its canonical JSON form so a run can report exactly which configuration
//! it executed under.
//!
//! Secrets never live in config values: the price-source section names an
//! *environment variable* holding the API key, not the key itself.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// The typed view of the effective configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub prices: PricesConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. The TSIM_DATABASE_PATH env var wins over this.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "tsim.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the company_tickers.json catalog file.
    pub path: String,
    /// Seed at most this many symbols (None = everything).
    pub seed_limit: Option<usize>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "company_tickers.json".to_string(),
            seed_limit: Some(50),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricesConfig {
    /// `http` or `fixed`.
    pub provider: String,
    /// Base URL of the quote service (http provider).
    pub base_url: Option<String>,
    /// Name of the env var holding the API key, if the service wants one.
    pub api_key_env: Option<String>,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            provider: "http".to_string(),
            base_url: None,
            api_key_env: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing-subscriber EnvFilter directive, e.g. `info` or `tsim=debug`.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// The merged configuration plus its provenance hash.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config: SimConfig,
}

/// Load and merge YAML files in order; earlier paths are base, later paths
/// override.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

/// Merge in-memory YAML documents; the string-based entry point exists so
/// tests and embedders need no filesystem.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    let config: SimConfig =
        serde_json::from_value(merged).context("config does not match expected shape")?;

    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config,
    })
}

/// Defaults only, for runs with no config file at all.
pub fn default_config() -> LoadedConfig {
    // empty object deserializes to all defaults; canonical form of "{}" keeps
    // the hash stable for the no-config case
    load_layered_yaml_from_strings(&["{}"]).expect("defaults always deserialize")
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // sort keys recursively so the hash does not depend on insertion order
    fn sort_keys(v: &Value) -> Value {
        match v {
            Value::Object(map) => {
                let mut keys: Vec<_> = map.keys().cloned().collect();
                keys.sort();
                let mut new = serde_json::Map::new();
                for k in keys {
                    new.insert(k.clone(), sort_keys(&map[&k]));
                }
                Value::Object(new)
            }
            Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
            _ => v.clone(),
        }
    }
    serde_json::to_string(&sort_keys(v)).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
