//! Analysis parameters: effect measure, pooling model, and toggles.

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Record count at which `auto` model selection switches to random-effects
pub const AUTO_RANDOM_THRESHOLD: usize = 5;

/// The statistic type being pooled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EffectMeasure {
    /// Odds ratio
    Or,
    /// Risk ratio
    Rr,
    /// Mean difference
    Md,
    /// Standardized mean difference
    Smd,
    /// Hazard ratio
    Hr,
}

impl EffectMeasure {
    /// Ratio-type measures are pooled on the log scale by the runtime and
    /// must be exponentiated back before reporting
    pub fn is_ratio(&self) -> bool {
        matches!(self, EffectMeasure::Or | EffectMeasure::Rr | EffectMeasure::Hr)
    }

    /// The study record shape this measure requires
    pub fn family(&self) -> OutcomeFamily {
        match self {
            EffectMeasure::Or | EffectMeasure::Rr | EffectMeasure::Hr => OutcomeFamily::Binary,
            EffectMeasure::Md | EffectMeasure::Smd => OutcomeFamily::Continuous,
        }
    }
}

impl std::fmt::Display for EffectMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectMeasure::Or => write!(f, "OR"),
            EffectMeasure::Rr => write!(f, "RR"),
            EffectMeasure::Md => write!(f, "MD"),
            EffectMeasure::Smd => write!(f, "SMD"),
            EffectMeasure::Hr => write!(f, "HR"),
        }
    }
}

impl FromStr for EffectMeasure {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OR" => Ok(EffectMeasure::Or),
            "RR" => Ok(EffectMeasure::Rr),
            "MD" => Ok(EffectMeasure::Md),
            "SMD" => Ok(EffectMeasure::Smd),
            "HR" => Ok(EffectMeasure::Hr),
            other => Err(CoreError::InvalidParameters {
                message: format!(
                    "unknown effect measure '{}' (expected OR, RR, MD, SMD, or HR)",
                    other
                ),
            }),
        }
    }
}

/// Outcome family determining which record fields are required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeFamily {
    /// Event counts per arm
    Binary,
    /// Means and standard deviations per arm
    Continuous,
}

/// Pooling model requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolingModel {
    /// Fixed-effect model
    Fixed,
    /// Random-effects model
    Random,
    /// Pick based on record count
    #[default]
    Auto,
}

impl PoolingModel {
    /// Resolve the requested model against the dispatched record count.
    ///
    /// `auto` resolves to fixed-effect below [`AUTO_RANDOM_THRESHOLD`]
    /// records and random-effects at or above it.
    pub fn resolve(&self, record_count: usize) -> ResolvedModel {
        match self {
            PoolingModel::Fixed => ResolvedModel::Fixed,
            PoolingModel::Random => ResolvedModel::Random,
            PoolingModel::Auto => {
                if record_count < AUTO_RANDOM_THRESHOLD {
                    ResolvedModel::Fixed
                } else {
                    ResolvedModel::Random
                }
            }
        }
    }
}

impl std::fmt::Display for PoolingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolingModel::Fixed => write!(f, "fixed"),
            PoolingModel::Random => write!(f, "random"),
            PoolingModel::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for PoolingModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(PoolingModel::Fixed),
            "random" => Ok(PoolingModel::Random),
            "auto" => Ok(PoolingModel::Auto),
            other => Err(CoreError::InvalidParameters {
                message: format!(
                    "unknown model '{}' (expected fixed, random, or auto)",
                    other
                ),
            }),
        }
    }
}

/// A pooling model after `auto` resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedModel {
    /// Fixed-effect model
    Fixed,
    /// Random-effects model
    Random,
}

impl std::fmt::Display for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedModel::Fixed => write!(f, "fixed"),
            ResolvedModel::Random => write!(f, "random"),
        }
    }
}

/// Parameters a session is created with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParameters {
    /// The statistic type to pool
    pub effect_measure: EffectMeasure,

    /// Requested pooling model
    #[serde(default)]
    pub model: PoolingModel,

    /// Confidence level for intervals
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,

    /// Compute heterogeneity statistics
    #[serde(default = "default_true")]
    pub heterogeneity: bool,

    /// Run publication-bias tests
    #[serde(default)]
    pub bias_assessment: bool,

    /// Run leave-one-out sensitivity analysis
    #[serde(default)]
    pub sensitivity_analysis: bool,
}

impl AnalysisParameters {
    /// Create parameters for a measure with everything else defaulted
    pub fn new(effect_measure: EffectMeasure) -> Self {
        Self {
            effect_measure,
            model: PoolingModel::default(),
            confidence_level: default_confidence_level(),
            heterogeneity: true,
            bias_assessment: false,
            sensitivity_analysis: false,
        }
    }

    /// Validate parameter values
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(CoreError::InvalidParameters {
                message: format!(
                    "confidence_level must be strictly between 0 and 1, got {}",
                    self.confidence_level
                ),
            });
        }
        Ok(())
    }
}

fn default_confidence_level() -> f64 {
    0.95
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolves_fixed_below_threshold() {
        assert_eq!(PoolingModel::Auto.resolve(4), ResolvedModel::Fixed);
    }

    #[test]
    fn test_auto_resolves_random_at_threshold() {
        assert_eq!(PoolingModel::Auto.resolve(5), ResolvedModel::Random);
    }

    #[test]
    fn test_explicit_models_ignore_count() {
        assert_eq!(PoolingModel::Fixed.resolve(100), ResolvedModel::Fixed);
        assert_eq!(PoolingModel::Random.resolve(2), ResolvedModel::Random);
    }

    #[test]
    fn test_ratio_measures() {
        assert!(EffectMeasure::Or.is_ratio());
        assert!(EffectMeasure::Hr.is_ratio());
        assert!(!EffectMeasure::Md.is_ratio());
        assert!(!EffectMeasure::Smd.is_ratio());
    }

    #[test]
    fn test_families() {
        assert_eq!(EffectMeasure::Rr.family(), OutcomeFamily::Binary);
        assert_eq!(EffectMeasure::Smd.family(), OutcomeFamily::Continuous);
    }

    #[test]
    fn test_measure_round_trips_serde() {
        let m: EffectMeasure = serde_json::from_str("\"SMD\"").unwrap();
        assert_eq!(m, EffectMeasure::Smd);
        assert_eq!(serde_json::to_string(&EffectMeasure::Or).unwrap(), "\"OR\"");
    }

    #[test]
    fn test_parameters_validate_confidence() {
        let mut p = AnalysisParameters::new(EffectMeasure::Or);
        assert!(p.validate().is_ok());
        p.confidence_level = 1.0;
        assert!(p.validate().is_err());
        p.confidence_level = 0.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("or".parse::<EffectMeasure>().unwrap(), EffectMeasure::Or);
        assert_eq!("auto".parse::<PoolingModel>().unwrap(), PoolingModel::Auto);
        assert!("xx".parse::<EffectMeasure>().is_err());
    }
}
