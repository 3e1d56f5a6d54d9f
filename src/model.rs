use crate::{error::ModelError, features::FeatureVector};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};
use tracing::debug;

const DEFAULT_MODEL_NAME: &str = "lightweight-phish-model";

/// Logistic model over the URL feature vector. Weights may name any subset
/// of the features; absent features contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlModel {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub bias: f64,
}

fn default_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

impl UrlModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let model: UrlModel =
            serde_json::from_str(&content).map_err(|source| ModelError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            "Loaded URL model {} from {}: {} weights, bias {}",
            model.name,
            path.display(),
            model.weights.len(),
            model.bias
        );
        Ok(model)
    }

    pub fn logit(&self, features: &FeatureVector) -> f64 {
        features
            .iter()
            .filter_map(|(name, value)| self.weights.get(name).map(|weight| weight * value))
            .fold(self.bias, |acc, term| acc + term)
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        sigmoid(self.logit(features))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
