use crate::heuristics::HeuristicOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Allow,
    Block,
    Malicious,
    Benign,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Allow => "allow",
            Label::Block => "block",
            Label::Malicious => "malicious",
            Label::Benign => "benign",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    Allowlist,
    Blocklist,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::Allowlist => "allowlist",
            OverrideKind::Blocklist => "blocklist",
        }
    }
}

/// Explanation attached to a [`ModelResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Factor {
    Override { reason: OverrideKind },
    Heuristic(HeuristicOutcome),
    ModelScore { probability: f64 },
}

/// Outcome of evaluating one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub url: String,
    pub score: f64,
    pub label: Label,
    pub threshold: f64,
    pub factors: Vec<Factor>,
    pub overrides: Vec<OverrideKind>,
    pub model_used: Option<String>,
}

impl ModelResult {
    /// Allowlisted results are never malicious, whatever their score.
    pub fn is_malicious(&self) -> bool {
        self.score >= self.threshold && !self.overrides.contains(&OverrideKind::Allowlist)
    }

    pub fn heuristic(&self) -> Option<&HeuristicOutcome> {
        self.factors.iter().find_map(|f| match f {
            Factor::Heuristic(outcome) => Some(outcome),
            _ => None,
        })
    }

    pub fn model_score(&self) -> Option<f64> {
        self.factors.iter().find_map(|f| match f {
            Factor::ModelScore { probability } => Some(*probability),
            _ => None,
        })
    }

    pub fn override_reason(&self) -> Option<OverrideKind> {
        self.factors.iter().find_map(|f| match f {
            Factor::Override { reason } => Some(*reason),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub url: String,
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub risk_score: f64,
    pub reasons: Vec<String>,
    pub signals: BTreeMap<String, Option<String>>,
}
