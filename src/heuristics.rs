use crate::{config::HeuristicSettings, features::FeatureVector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    KeywordMatch,
    ManyDigits,
    LongUrl,
    DeepSubdomains,
    SuspiciousTld,
    Https,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::KeywordMatch => "keyword_match",
            Rule::ManyDigits => "many_digits",
            Rule::LongUrl => "long_url",
            Rule::DeepSubdomains => "deep_subdomains",
            Rule::SuspiciousTld => "suspicious_tld",
            Rule::Https => "https",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Rule::KeywordMatch => "Suspicious keyword detected in URL",
            Rule::ManyDigits => "URL contains an unusual share of digits",
            Rule::LongUrl => "URL is unusually long",
            Rule::DeepSubdomains => "Host has deeply nested subdomains",
            Rule::SuspiciousTld => "Top-level domain is frequently abused",
            Rule::Https => "HTTPS lowered the risk score",
        }
    }
}

/// One signed term of the heuristic score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Contribution {
    BaseScore { weight: f64 },
    RuleMatch { rule: Rule, weight: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicOutcome {
    pub score: f64,
    pub contributions: Vec<Contribution>,
}

impl HeuristicOutcome {
    pub fn contribution(&self, rule: Rule) -> Option<f64> {
        self.contributions.iter().find_map(|c| match c {
            Contribution::RuleMatch { rule: r, weight } if *r == rule => Some(*weight),
            _ => None,
        })
    }

    pub fn base(&self) -> Option<f64> {
        self.contributions.iter().find_map(|c| match c {
            Contribution::BaseScore { weight } => Some(*weight),
            _ => None,
        })
    }

    pub fn fired_rules(&self) -> impl Iterator<Item = Rule> + '_ {
        self.contributions.iter().filter_map(|c| match c {
            Contribution::RuleMatch { rule, .. } => Some(*rule),
            Contribution::BaseScore { .. } => None,
        })
    }
}

/// Scores `features` against the weighted rules in `settings`.
///
/// Additive rules are independent. The HTTPS discount runs last so it
/// applies to the cumulative score, and is capped so it never takes the
/// score below zero. The result is clamped to `[0, 1]`.
pub fn score(features: &FeatureVector, settings: &HeuristicSettings) -> HeuristicOutcome {
    let mut contributions = Vec::new();
    let mut score = settings.base_score;
    if settings.base_score != 0.0 {
        contributions.push(Contribution::BaseScore {
            weight: settings.base_score,
        });
    }

    let mut add = |rule: Rule, weight: f64, score: &mut f64| {
        contributions.push(Contribution::RuleMatch { rule, weight });
        *score += weight;
    };

    if features.keyword_flag > 0.0 {
        add(Rule::KeywordMatch, settings.keyword_weight, &mut score);
    }

    // Thresholds are percentages and character counts, not ratios.
    if features.digit_ratio * 100.0 >= settings.digit_threshold as f64 {
        add(Rule::ManyDigits, settings.digit_weight, &mut score);
    }

    if features.length_norm * 100.0 >= settings.length_threshold as f64 {
        add(Rule::LongUrl, settings.length_weight, &mut score);
    }

    // Recovers an approximate dot count; hosts beyond five extra labels
    // are indistinguishable from exactly five.
    if features.subdomain_ratio * 4.0 >= settings.subdomain_threshold as f64 {
        add(Rule::DeepSubdomains, settings.subdomain_weight, &mut score);
    }

    if features.suspicious_tld > 0.0 {
        add(Rule::SuspiciousTld, settings.suspicious_tld_weight, &mut score);
    }

    if features.https_flag > 0.0 {
        let bonus = settings.https_bonus.min(score);
        if bonus > 0.0 {
            add(Rule::Https, -bonus, &mut score);
        }
    }

    HeuristicOutcome {
        score: score.clamp(0.0, 1.0),
        contributions,
    }
}
