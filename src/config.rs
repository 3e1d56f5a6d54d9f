use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::{
    collections::HashSet,
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};

pub const CONFIG_ENV_VAR: &str = "PHISHSENTRY_CONFIG";
const ENV_PREFIX: &str = "PHISHSENTRY";

/// Bundled configuration used when [`CONFIG_ENV_VAR`] is unset.
pub fn bundled_config_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("default_config.json")
}

/// Weighted-rule configuration for the heuristic scorer. Weights are not
/// required to sum to at most one; the scorer clamps its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicSettings {
    #[serde(deserialize_with = "whole_number")]
    pub digit_threshold: i64,
    pub digit_weight: f64,
    #[serde(deserialize_with = "whole_number")]
    pub length_threshold: i64,
    pub length_weight: f64,
    #[serde(deserialize_with = "whole_number")]
    pub subdomain_threshold: i64,
    pub subdomain_weight: f64,
    /// Accepted for document compatibility only. The `suspicious_tld`
    /// feature checks a fixed TLD set and nothing reads this list.
    pub suspicious_tlds: Vec<String>,
    pub suspicious_tld_weight: f64,
    pub keyword_weight: f64,
    pub https_bonus: f64,
    pub base_score: f64,
}

/// Thresholds are integers; floats are truncated toward zero.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(value) => Ok(value),
        Number::Float(value) if value.is_finite() => Ok(value.trunc() as i64),
        Number::Float(value) => Err(de::Error::custom(format!(
            "threshold must be a finite number, got {}",
            value
        ))),
    }
}

impl Default for HeuristicSettings {
    fn default() -> Self {
        Self {
            digit_threshold: 6,
            digit_weight: 0.15,
            length_threshold: 40,
            length_weight: 0.2,
            subdomain_threshold: 3,
            subdomain_weight: 0.15,
            suspicious_tlds: ["zip", "xyz", "top", "click"]
                .into_iter()
                .map(String::from)
                .collect(),
            suspicious_tld_weight: 0.15,
            keyword_weight: 0.2,
            https_bonus: 0.1,
            base_score: 0.05,
        }
    }
}

/// Immutable engine configuration snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub model_path: Option<PathBuf>,
    pub model_weight: f64,
    pub phishing_threshold: f64,
    pub blocklist: HashSet<String>,
    pub allowlist: HashSet<String>,
    pub heuristics: HeuristicSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            model_weight: 0.7,
            phishing_threshold: 0.6,
            blocklist: HashSet::new(),
            allowlist: HashSet::new(),
            heuristics: HeuristicSettings::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    model: RawModel,
    thresholds: RawThresholds,
    blocklist: Option<ListSpec>,
    allowlist: Option<ListSpec>,
    heuristics: HeuristicSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawModel {
    path: Option<String>,
    weight: f64,
}

impl Default for RawModel {
    fn default() -> Self {
        Self {
            path: None,
            weight: 0.7,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawThresholds {
    phishing: f64,
}

impl Default for RawThresholds {
    fn default() -> Self {
        Self { phishing: 0.6 }
    }
}

/// Either an inline list of URLs or `{items, path}` where `path` names a
/// file with one URL per line.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListSpec {
    Inline(Vec<String>),
    Source {
        #[serde(default)]
        items: Vec<String>,
        #[serde(default)]
        path: Option<String>,
    },
}

impl EngineConfig {
    /// Loads `path` as JSON, layered with `PHISHSENTRY__SECTION__KEY`
    /// environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw: RawConfig = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Json))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        let base_dir = path.parent().map(Path::to_path_buf);
        let config = Self::from_raw(raw, base_dir.as_deref())?;
        info!(
            "Loaded engine configuration from {} ({} blocklisted, {} allowlisted, model: {:?})",
            path.display(),
            config.blocklist.len(),
            config.allowlist.len(),
            config.model_path
        );
        Ok(config)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| bundled_config_path());
        Self::load(path)
    }

    /// Builds a configuration from an in-memory JSON document. Relative
    /// paths resolve against `base_dir` when given.
    pub fn from_value(value: serde_json::Value, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_value(value)?;
        Self::from_raw(raw, base_dir)
    }

    fn from_raw(raw: RawConfig, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let model_weight = unit_interval("model.weight", raw.model.weight)?;
        let phishing_threshold = unit_interval("thresholds.phishing", raw.thresholds.phishing)?;

        let model_path = raw
            .model
            .path
            .filter(|p| !p.trim().is_empty())
            .map(|p| resolve(Path::new(p.trim()), base_dir));

        Ok(Self {
            model_path,
            model_weight,
            phishing_threshold,
            blocklist: load_list(raw.blocklist, base_dir)?,
            allowlist: load_list(raw.allowlist, base_dir)?,
            heuristics: raw.heuristics,
        })
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

fn resolve(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

fn load_list(spec: Option<ListSpec>, base_dir: Option<&Path>) -> Result<HashSet<String>, ConfigError> {
    let mut values = HashSet::new();
    let (items, list_path) = match spec {
        None => return Ok(values),
        Some(ListSpec::Inline(items)) => (items, None),
        Some(ListSpec::Source { items, path }) => (items, path),
    };

    values.extend(
        items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(String::from),
    );

    if let Some(list_path) = list_path.filter(|p| !p.is_empty()) {
        let file_path = resolve(Path::new(&list_path), base_dir);
        if !file_path.exists() {
            warn!("List file {} does not exist, skipping", file_path.display());
            return Ok(values);
        }
        let content = std::fs::read_to_string(&file_path).map_err(|source| ConfigError::ListFile {
            path: file_path.clone(),
            source,
        })?;
        values.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }

    Ok(values)
}

/// Settings for the HTTP binary, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub default_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("PHISHSENTRY_BIND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        let timeout_ms = env::var("PHISHSENTRY_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .unwrap_or(2000);

        ServerConfig {
            bind_addr,
            default_timeout: Duration::from_millis(timeout_ms),
        }
    }
}
