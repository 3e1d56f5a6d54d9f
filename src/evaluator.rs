use crate::{
    config::EngineConfig,
    error::ConfigError,
    features,
    heuristics,
    model::UrlModel,
    types::{Factor, Label, ModelResult, OverrideKind},
};
use parking_lot::{Mutex, RwLock};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct CachedModel {
    path: PathBuf,
    model: Arc<UrlModel>,
}

/// Scores URLs against an engine configuration.
///
/// The evaluator holds a configuration snapshot that can be replaced with
/// [`Evaluator::set_config`]; evaluations already running keep the snapshot
/// they started with. The loaded model artifact is cached by path and
/// reloaded only when the configured path changes.
#[derive(Debug)]
pub struct Evaluator {
    config: RwLock<Arc<EngineConfig>>,
    model_cache: Mutex<Option<CachedModel>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Evaluator {
    pub fn new(config: EngineConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<EngineConfig>) -> Self {
        Self {
            config: RwLock::new(config),
            model_cache: Mutex::new(None),
        }
    }

    /// Builds an evaluator from [`EngineConfig::load_default`].
    pub fn from_default_config() -> Result<Self, ConfigError> {
        Ok(Self::new(EngineConfig::load_default()?))
    }

    pub fn config(&self) -> Arc<EngineConfig> {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: EngineConfig) {
        *self.config.write() = Arc::new(config);
        info!("Engine configuration replaced");
    }

    pub fn evaluate(&self, url: &str) -> ModelResult {
        let config = self.config();
        self.evaluate_with(url, &config)
    }

    /// Evaluates `url` against `config` instead of the evaluator's own snapshot.
    pub fn evaluate_with(&self, url: &str, config: &EngineConfig) -> ModelResult {
        if config.allowlist.contains(url) {
            return override_result(url, OverrideKind::Allowlist, config);
        }
        if config.blocklist.contains(url) {
            return override_result(url, OverrideKind::Blocklist, config);
        }

        let features = features::extract(url);
        let heuristic = heuristics::score(&features, &config.heuristics);
        let heuristic_score = heuristic.score;

        let model = config
            .model_path
            .as_deref()
            .and_then(|path| self.model_for(path));

        let mut factors = vec![Factor::Heuristic(heuristic)];
        let (score, model_used) = match model {
            Some(model) => {
                let probability = model.predict(&features);
                factors.push(Factor::ModelScore { probability });
                let blended =
                    config.model_weight * probability + (1.0 - config.model_weight) * heuristic_score;
                (blended, Some(model.name.clone()))
            }
            None => (heuristic_score, None),
        };

        let score = score.clamp(0.0, 1.0);
        let label = if score >= config.phishing_threshold {
            Label::Malicious
        } else {
            Label::Benign
        };

        metrics::counter!("url_evaluations_total", "label" => label.as_str()).increment(1);
        debug!(
            "Evaluated {}: score {:.3} ({}), heuristic {:.3}, model {:?}",
            url,
            score,
            label.as_str(),
            heuristic_score,
            model_used
        );

        ModelResult {
            url: url.to_string(),
            score,
            label,
            threshold: config.phishing_threshold,
            factors,
            overrides: Vec::new(),
            model_used,
        }
    }

    /// Returns the cached model for `path`, loading it on a miss. A failed
    /// load clears the cache and yields `None`.
    fn model_for(&self, path: &Path) -> Option<Arc<UrlModel>> {
        if let Some(cached) = self.model_cache.lock().as_ref() {
            if cached.path == path {
                return Some(cached.model.clone());
            }
        }

        // Loaded outside the lock; concurrent misses may load twice.
        debug!("Model cache miss for {}", path.display());
        match UrlModel::load(path) {
            Ok(model) => {
                let model = Arc::new(model);
                info!("Loaded URL model {} from {}", model.name, path.display());
                *self.model_cache.lock() = Some(CachedModel {
                    path: path.to_path_buf(),
                    model: model.clone(),
                });
                Some(model)
            }
            Err(e) => {
                warn!("Model unavailable, scoring with heuristics only: {}", e);
                metrics::counter!("model_load_failures_total").increment(1);
                *self.model_cache.lock() = None;
                None
            }
        }
    }
}

fn override_result(url: &str, kind: OverrideKind, config: &EngineConfig) -> ModelResult {
    let (score, label) = match kind {
        OverrideKind::Allowlist => (0.0, Label::Allow),
        OverrideKind::Blocklist => (1.0, Label::Block),
    };
    metrics::counter!("url_evaluations_total", "label" => label.as_str()).increment(1);
    debug!("{} matched the {}", url, kind.as_str());

    ModelResult {
        url: url.to_string(),
        score,
        label,
        threshold: config.phishing_threshold,
        factors: vec![Factor::Override { reason: kind }],
        overrides: vec![kind],
        model_used: None,
    }
}
