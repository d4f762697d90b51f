//! Study records: one row of evidence contributed to a computation.

use crate::params::OutcomeFamily;
use serde::{Deserialize, Serialize};

/// One validated row of evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    /// Stable record identifier within the session
    pub id: String,

    /// Study label (author/trial name)
    pub name: String,

    /// Publication year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Outcome data, shaped by the effect-measure family
    #[serde(flatten)]
    pub outcome: OutcomeData,

    /// Precomputed effect size, if supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<f64>,

    /// Precomputed CI lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_lower: Option<f64>,

    /// Precomputed CI upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_upper: Option<f64>,

    /// Caller-supplied weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Study quality score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

/// Outcome data for one record.
///
/// Untagged: the field set alone identifies the shape. Binary must come
/// first so continuous rows (which lack `events_*`) fall through to the
/// second variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomeData {
    /// Event counts per arm
    Binary {
        n_treatment: u64,
        n_control: u64,
        events_treatment: u64,
        events_control: u64,
    },
    /// Means and standard deviations per arm
    Continuous {
        n_treatment: u64,
        n_control: u64,
        mean_treatment: f64,
        sd_treatment: f64,
        mean_control: f64,
        sd_control: f64,
    },
}

/// How many arms of a binary record have zero events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroEventArms {
    /// No zero-event arm (also used for continuous records)
    Neither,
    /// Exactly one arm has zero events
    One,
    /// Both arms have zero events
    Both,
}

impl OutcomeData {
    /// The family this outcome belongs to
    pub fn family(&self) -> OutcomeFamily {
        match self {
            OutcomeData::Binary { .. } => OutcomeFamily::Binary,
            OutcomeData::Continuous { .. } => OutcomeFamily::Continuous,
        }
    }

    /// Total sample size across both arms
    pub fn total_n(&self) -> u64 {
        match self {
            OutcomeData::Binary {
                n_treatment,
                n_control,
                ..
            }
            | OutcomeData::Continuous {
                n_treatment,
                n_control,
                ..
            } => n_treatment + n_control,
        }
    }

    /// Zero-event classification for the dispatch policy
    pub fn zero_event_arms(&self) -> ZeroEventArms {
        match self {
            OutcomeData::Binary {
                events_treatment,
                events_control,
                ..
            } => match (*events_treatment == 0, *events_control == 0) {
                (true, true) => ZeroEventArms::Both,
                (false, false) => ZeroEventArms::Neither,
                _ => ZeroEventArms::One,
            },
            OutcomeData::Continuous { .. } => ZeroEventArms::Neither,
        }
    }
}
