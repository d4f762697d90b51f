//! Computed analysis results.
//!
//! Ratio-type effect measures (OR/RR/HR) are pooled by the runtime on the
//! log scale; [`AnalysisResult::exponentiate`] converts the estimate, its
//! interval, and the per-record contributions back to the natural scale
//! before the result is stored or reported. MD/SMD results stay on their
//! native scale and are never transformed.

use crate::params::ResolvedModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pooled overall effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallEffect {
    /// Point estimate
    pub estimate: f64,
    /// Interval lower bound
    pub ci_lower: f64,
    /// Interval upper bound
    pub ci_upper: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Test statistic
    pub z_score: f64,
}

/// Between-study heterogeneity statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heterogeneity {
    /// I² (proportion of variance from heterogeneity)
    pub i_squared: f64,
    /// Cochran's Q
    pub q_statistic: f64,
    /// τ² (between-study variance)
    pub tau_squared: f64,
    /// p-value of the Q test
    pub q_p_value: f64,
}

/// Model metadata recorded with a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// The model actually used, after `auto` resolution
    pub kind: ResolvedModel,
    /// Whether the Hartung-Knapp adjustment was requested
    pub hartung_knapp: bool,
    /// Number of records dispatched to the runtime
    pub record_count: usize,
}

/// One record's contribution to the pooled estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordContribution {
    /// Record id this contribution belongs to
    pub record_id: String,
    /// Per-record effect size
    pub effect_size: f64,
    /// Per-record interval lower bound
    pub ci_lower: f64,
    /// Per-record interval upper bound
    pub ci_upper: f64,
    /// Pooling weight (percent)
    pub weight: f64,
}

/// Publication-bias test outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BiasAssessment {
    /// Egger regression intercept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egger_intercept: Option<f64>,
    /// Egger test p-value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egger_p_value: Option<f64>,
    /// Begg rank-correlation p-value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begg_p_value: Option<f64>,
    /// Trim-and-fill adjusted estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_and_fill_estimate: Option<f64>,
}

/// Complete output of one successful computation.
///
/// Exclusively owned by the session that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Pooled effect
    pub overall: OverallEffect,

    /// Heterogeneity statistics, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heterogeneity: Option<Heterogeneity>,

    /// Model metadata
    pub model: ModelInfo,

    /// Per-record contributions
    #[serde(default)]
    pub contributions: Vec<RecordContribution>,

    /// Bias-test outputs, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<BiasAssessment>,

    /// When the computation finished
    pub computed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Convert a log-scale result back to the natural scale.
    ///
    /// Applied exactly once, by the dispatcher, for ratio-type measures.
    pub fn exponentiate(&mut self) {
        self.overall.estimate = self.overall.estimate.exp();
        self.overall.ci_lower = self.overall.ci_lower.exp();
        self.overall.ci_upper = self.overall.ci_upper.exp();
        for c in &mut self.contributions {
            c.effect_size = c.effect_size.exp();
            c.ci_lower = c.ci_lower.exp();
            c.ci_upper = c.ci_upper.exp();
        }
        if let Some(bias) = &mut self.bias {
            if let Some(tf) = bias.trim_and_fill_estimate {
                bias.trim_and_fill_estimate = Some(tf.exp());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_scale_result() -> AnalysisResult {
        AnalysisResult {
            overall: OverallEffect {
                estimate: 0.0,
                ci_lower: -0.5,
                ci_upper: 0.5,
                p_value: 1.0,
                z_score: 0.0,
            },
            heterogeneity: None,
            model: ModelInfo {
                kind: ResolvedModel::Fixed,
                hartung_knapp: false,
                record_count: 3,
            },
            contributions: vec![RecordContribution {
                record_id: "r1".to_string(),
                effect_size: 0.0,
                ci_lower: -1.0,
                ci_upper: 1.0,
                weight: 100.0,
            }],
            bias: None,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn test_exponentiate_maps_log_zero_to_one() {
        let mut r = log_scale_result();
        r.exponentiate();
        assert!((r.overall.estimate - 1.0).abs() < 1e-12);
        assert!(r.overall.ci_lower < 1.0 && r.overall.ci_upper > 1.0);
        assert!((r.contributions[0].effect_size - 1.0).abs() < 1e-12);
        // z and p are scale-free
        assert_eq!(r.overall.z_score, 0.0);
        assert_eq!(r.overall.p_value, 1.0);
    }

    #[test]
    fn test_result_serde_round_trip() {
        let r = log_scale_result();
        let json = serde_json::to_string(&r).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
