//! Weighted complexity scoring over aggregate import statistics.
//!
//! The weight map must carry every required category and stay inside
//! `[0.0, 5.0]`; anything else is a configuration error caught before any
//! analysis runs.

use crate::core::errors::{Error, Result};
use crate::core::ImportStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categories every weight map must price.
pub const REQUIRED_WEIGHT_KEYS: [&str; 7] = [
    "total_imports",
    "unique_imports",
    "edges",
    "invalid_imports",
    "unused_imports",
    "relative_imports",
    "circular_refs",
];

pub const MAX_WEIGHT: f64 = 5.0;

/// Per-category weight factors. Deserializes straight from a TOML table,
/// so a user-provided table replaces the defaults wholesale and must be
/// complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightConfig {
    factors: BTreeMap<String, f64>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        let mut factors = BTreeMap::new();
        factors.insert("total_imports".to_string(), 0.5);
        factors.insert("unique_imports".to_string(), 1.0);
        factors.insert("edges".to_string(), 1.5);
        factors.insert("invalid_imports".to_string(), 3.0);
        factors.insert("unused_imports".to_string(), 2.0);
        factors.insert("relative_imports".to_string(), 1.0);
        factors.insert("circular_refs".to_string(), 5.0);
        Self { factors }
    }
}

impl WeightConfig {
    pub fn from_factors(factors: BTreeMap<String, f64>) -> Self {
        Self { factors }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.factors.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.factors.insert(key.into(), value);
    }

    /// Reject missing required keys and out-of-range factors. NaN fails the
    /// range check.
    pub fn validate(&self) -> Result<()> {
        for key in REQUIRED_WEIGHT_KEYS {
            if !self.factors.contains_key(key) {
                return Err(Error::config(format!("missing weight factor '{key}'")));
            }
        }
        for (key, value) in &self.factors {
            if !(0.0..=MAX_WEIGHT).contains(value) {
                return Err(Error::config(format!(
                    "weight factor '{key}' is {value}, must be between 0.0 and {MAX_WEIGHT}"
                )));
            }
        }
        Ok(())
    }

    fn factor(&self, key: &str) -> f64 {
        self.factors.get(key).copied().unwrap_or(0.0)
    }
}

/// Σ(category count × weight), rounded to one decimal place. Pure; the
/// same stats and weights always produce the same score.
pub fn calculate_complexity(stats: &ImportStats, weights: &WeightConfig) -> Result<f64> {
    weights.validate()?;
    let raw = stats.total_imports as f64 * weights.factor("total_imports")
        + stats.unique_imports as f64 * weights.factor("unique_imports")
        + stats.total_edges as f64 * weights.factor("edges")
        + stats.invalid_imports as f64 * weights.factor("invalid_imports")
        + stats.unused_imports as f64 * weights.factor("unused_imports")
        + stats.relative_imports as f64 * weights.factor("relative_imports")
        + stats.circular_refs_count as f64 * weights.factor("circular_refs");
    Ok((raw * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_stats() -> ImportStats {
        ImportStats {
            total_imports: 10,
            unique_imports: 5,
            total_edges: 8,
            invalid_imports: 2,
            unused_imports: 3,
            relative_imports: 4,
            circular_refs_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn default_weights_are_valid() {
        assert!(WeightConfig::default().validate().is_ok());
    }

    #[test]
    fn score_is_deterministic() {
        let stats = fixed_stats();
        let weights = WeightConfig::default();
        let first = calculate_complexity(&stats, &weights).unwrap();
        let second = calculate_complexity(&stats, &weights).unwrap();
        assert_eq!(first, second);
        // 10*0.5 + 5*1.0 + 8*1.5 + 2*3.0 + 3*2.0 + 4*1.0 + 1*5.0
        assert_eq!(first, 43.0);
    }

    #[test]
    fn raising_a_weight_raises_the_score() {
        let stats = fixed_stats();
        let baseline = calculate_complexity(&stats, &WeightConfig::default()).unwrap();
        let mut heavier = WeightConfig::default();
        heavier.set("invalid_imports", 3.5);
        let raised = calculate_complexity(&stats, &heavier).unwrap();
        assert!(raised > baseline);
    }

    #[test]
    fn missing_required_key_is_a_config_error() {
        let factors: BTreeMap<String, f64> = REQUIRED_WEIGHT_KEYS
            .iter()
            .filter(|k| **k != "circular_refs")
            .map(|k| (k.to_string(), 1.0))
            .collect();
        let weights = WeightConfig::from_factors(factors);
        let err = calculate_complexity(&fixed_stats(), &weights).unwrap_err();
        assert!(err.to_string().contains("circular_refs"));
    }

    #[test]
    fn out_of_range_weight_is_a_config_error() {
        let mut weights = WeightConfig::default();
        weights.set("edges", 6.0);
        assert!(weights.validate().is_err());

        let mut negative = WeightConfig::default();
        negative.set("edges", -0.1);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn score_rounds_to_one_decimal() {
        let mut weights = WeightConfig::default();
        weights.set("total_imports", 0.33);
        let stats = ImportStats {
            total_imports: 1,
            ..Default::default()
        };
        assert_eq!(calculate_complexity(&stats, &weights).unwrap(), 0.3);
    }
}
