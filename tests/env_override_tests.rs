//! Environment overrides. Kept in its own test binary because it mutates
//! process environment.

use phishsentry_engine::{config::bundled_config_path, EngineConfig};

#[test]
fn environment_overrides_file_values() {
    std::env::set_var("PHISHSENTRY__THRESHOLDS__PHISHING", "0.8");
    std::env::set_var("PHISHSENTRY__HEURISTICS__KEYWORD_WEIGHT", "0.35");

    let config = EngineConfig::load(bundled_config_path()).unwrap();

    std::env::remove_var("PHISHSENTRY__THRESHOLDS__PHISHING");
    std::env::remove_var("PHISHSENTRY__HEURISTICS__KEYWORD_WEIGHT");

    assert_eq!(config.phishing_threshold, 0.8);
    assert_eq!(config.heuristics.keyword_weight, 0.35);
    assert_eq!(config.heuristics.length_weight, 0.2);
}
