use crate::{
    evaluator::Evaluator,
    heuristics::Rule,
    types::{Factor, ModelResult, OverrideKind},
};
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_REASON: &str = "Heuristic analysis completed";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Failed(String),
}

/// Transport-facing view of a scored URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub risk_score: f64,
    pub reasons: Vec<String>,
    pub signals: BTreeMap<String, Option<String>>,
}

/// Engine behind the HTTP layer. Implementations are called from the
/// blocking pool and must not assume an async context.
pub trait ScoringEngine: Send + Sync {
    fn score_url(&self, url: &str) -> Result<ScoreReport, ScoringError>;
}

impl ScoringEngine for Evaluator {
    fn score_url(&self, url: &str) -> Result<ScoreReport, ScoringError> {
        Ok(ScoreReport::from(&self.evaluate(url)))
    }
}

impl From<&ModelResult> for ScoreReport {
    fn from(result: &ModelResult) -> Self {
        let mut reasons = Vec::new();
        for factor in &result.factors {
            match factor {
                Factor::Override { reason } => reasons.push(match reason {
                    OverrideKind::Allowlist => "URL is on the allowlist".to_string(),
                    OverrideKind::Blocklist => "URL is on the blocklist".to_string(),
                }),
                Factor::Heuristic(outcome) => {
                    reasons.extend(outcome.fired_rules().map(|rule: Rule| rule.describe().to_string()))
                }
                Factor::ModelScore { probability } => reasons.push(format!(
                    "Model {} estimated phishing probability {:.3}",
                    result.model_used.as_deref().unwrap_or("unknown"),
                    probability
                )),
            }
        }
        if reasons.is_empty() {
            reasons.push(DEFAULT_REASON.to_string());
        }

        let overrides = result
            .overrides
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut signals = BTreeMap::new();
        signals.insert("label".to_string(), Some(result.label.as_str().to_string()));
        signals.insert("threshold".to_string(), Some(result.threshold.to_string()));
        signals.insert(
            "heuristic_score".to_string(),
            result.heuristic().map(|h| format!("{:.4}", h.score)),
        );
        signals.insert(
            "model_score".to_string(),
            result.model_score().map(|p| format!("{:.4}", p)),
        );
        signals.insert("model_used".to_string(), result.model_used.clone());
        signals.insert(
            "overrides".to_string(),
            Some(overrides).filter(|s| !s.is_empty()),
        );

        ScoreReport {
            risk_score: result.score,
            reasons,
            signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, HeuristicSettings};
    use std::collections::HashSet;

    #[test]
    fn blocklisted_report() {
        let config = EngineConfig {
            blocklist: HashSet::from(["http://evil.example".to_string()]),
            ..EngineConfig::default()
        };
        let report = Evaluator::new(config).score_url("http://evil.example").unwrap();
        assert_eq!(report.risk_score, 1.0);
        assert_eq!(report.reasons, vec!["URL is on the blocklist"]);
        assert_eq!(report.signals["label"].as_deref(), Some("block"));
        assert_eq!(report.signals["overrides"].as_deref(), Some("blocklist"));
        assert_eq!(report.signals["heuristic_score"], None);
    }

    #[test]
    fn rule_reasons_follow_fired_rules() {
        let report = Evaluator::default()
            .score_url("http://login-secure-update.example.com/account")
            .unwrap();
        assert_eq!(
            report.reasons,
            vec![Rule::KeywordMatch.describe(), Rule::LongUrl.describe()]
        );
        assert_eq!(report.signals["model_used"], None);
        assert_eq!(report.signals["overrides"], None);
        assert_eq!(report.signals["label"].as_deref(), Some("benign"));
    }

    #[test]
    fn quiet_url_gets_default_reason() {
        let config = EngineConfig {
            heuristics: HeuristicSettings {
                base_score: 0.0,
                ..HeuristicSettings::default()
            },
            ..EngineConfig::default()
        };
        let report = Evaluator::new(config).score_url("http://example.com").unwrap();
        assert_eq!(report.reasons, vec![DEFAULT_REASON]);
        assert_eq!(report.risk_score, 0.0);
    }
}
