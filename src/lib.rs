//! Phishing-risk scoring for URLs.
//!
//! A URL is reduced to a fixed [`FeatureVector`](features::FeatureVector),
//! scored by weighted heuristic rules, optionally blended with a logistic
//! [`UrlModel`](model::UrlModel), and labelled against a threshold.
//! Allowlist and blocklist matches short-circuit scoring. The
//! [`Evaluator`](evaluator::Evaluator) ties these together; [`routes`]
//! exposes it over HTTP.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod heuristics;
pub mod model;
pub mod routes;
pub mod service;
pub mod types;

pub use config::{EngineConfig, HeuristicSettings, ServerConfig};
pub use error::{AppError, ConfigError, ModelError};
pub use evaluator::Evaluator;
pub use features::{extract, FeatureVector};
pub use heuristics::{Contribution, HeuristicOutcome, Rule};
pub use model::UrlModel;
pub use service::{ScoreReport, ScoringEngine, ScoringError};
pub use types::{Factor, Label, ModelResult, OverrideKind};
