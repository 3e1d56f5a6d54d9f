use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use url::Url;

pub const FEATURE_NAMES: [&str; 7] = [
    "length_norm",
    "digit_ratio",
    "keyword_flag",
    "has_ip",
    "subdomain_ratio",
    "https_flag",
    "suspicious_tld",
];

const SUSPICIOUS_KEYWORDS: [&str; 8] = [
    "login", "secure", "update", "verify", "account", "bank", "invoice", "alert",
];

const SUSPICIOUS_TLDS: [&str; 5] = ["zip", "xyz", "top", "click", "link"];

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9]?[0-9])$")
            .expect("ipv4 pattern is valid")
    })
}

/// Fixed-schema numeric summary of a URL. Every value is finite and
/// depends only on the URL string.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    pub length_norm: f64,
    pub digit_ratio: f64,
    pub keyword_flag: f64,
    pub has_ip: f64,
    pub subdomain_ratio: f64,
    pub https_flag: f64,
    pub suspicious_tld: f64,
}

impl FeatureVector {
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "length_norm" => self.length_norm,
            "digit_ratio" => self.digit_ratio,
            "keyword_flag" => self.keyword_flag,
            "has_ip" => self.has_ip,
            "subdomain_ratio" => self.subdomain_ratio,
            "https_flag" => self.https_flag,
            "suspicious_tld" => self.suspicious_tld,
            _ => return None,
        };
        Some(value)
    }

    /// Name/value pairs in [`FEATURE_NAMES`] order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES
            .iter()
            .filter_map(move |name| self.get(name).map(|value| (*name, value)))
    }
}

/// Extracts the feature vector for `url`. Never fails: without an
/// authority the host is empty, and a URL the parser rejects still keeps the
/// scheme written before `://`.
pub fn extract(url: &str) -> FeatureVector {
    let authority = split_authority(url);
    let scheme = match Url::parse(url) {
        Ok(parsed) => parsed.scheme().to_string(),
        Err(_) => authority
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default(),
    };
    // Host text as written; the parser would canonicalise numeric hosts.
    let host = authority
        .map(|(_, authority)| host_of(authority).to_lowercase())
        .unwrap_or_default();

    let length = url.chars().count();
    let digits = url.chars().filter(|c| c.is_ascii_digit()).count();
    let lowered = url.to_lowercase();

    FeatureVector {
        length_norm: (length as f64 / 100.0).min(1.0),
        digit_ratio: digits as f64 / length.max(1) as f64,
        keyword_flag: flag(SUSPICIOUS_KEYWORDS.iter().any(|word| lowered.contains(word))),
        has_ip: flag(ipv4_pattern().is_match(&host)),
        subdomain_ratio: subdomain_ratio(&host),
        https_flag: flag(scheme == "https"),
        suspicious_tld: flag(tld_is_suspicious(&host)),
    }
}

/// Splits `scheme://authority/...` into the scheme and the raw authority,
/// which ends at the first `/`, `?` or `#`.
fn split_authority(url: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    let mut chars = scheme.chars();
    let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return None;
    }
    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    Some((scheme, &rest[..end]))
}

/// Drops `user@` and `:port` from an authority. Bracketed IPv6 hosts lose
/// their brackets.
fn host_of(authority: &str) -> &str {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if let Some(bracketed) = host_port.strip_prefix('[') {
        return bracketed.split_once(']').map_or("", |(host, _)| host);
    }
    host_port.split_once(':').map_or(host_port, |(host, _)| host)
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

// The first dot is taken as the domain/TLD boundary.
fn subdomain_ratio(host: &str) -> f64 {
    let dots = host.matches('.').count();
    (dots.saturating_sub(1) as f64 / 4.0).min(1.0)
}

fn tld_is_suspicious(host: &str) -> bool {
    match host.rsplit_once('.') {
        Some((_, tld)) => SUSPICIOUS_TLDS.contains(&tld.to_lowercase().as_str()),
        None => false,
    }
}
