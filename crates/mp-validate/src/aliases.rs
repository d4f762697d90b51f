//! Declarative column-alias mapping.
//!
//! Uploads name their columns every way imaginable (`n_exp`, `n_e`,
//! `treatment_n`, ...). The synonym table below maps them all onto the
//! canonical field names the validator consumes. The mapping is data, not
//! branching logic, and applying it is a fixed point: normalizing
//! already-normalized input changes nothing.

use crate::decode::RawRow;

/// Canonical field name and its accepted aliases
const ALIASES: &[(&str, &[&str])] = &[
    ("id", &["study_id", "record_id", "trial_id"]),
    ("name", &["study", "study_name", "label", "studlab", "author", "trial"]),
    ("year", &["publication_year", "pub_year"]),
    (
        "n_treatment",
        &["n_exp", "n_e", "treatment_n", "n_t", "n1", "n_intervention", "n_active"],
    ),
    (
        "n_control",
        &["n_ctrl", "n_c", "control_n", "n2", "n_placebo", "n_comparator"],
    ),
    (
        "events_treatment",
        &["events_exp", "events_e", "e_t", "event_treatment", "e1", "events1"],
    ),
    (
        "events_control",
        &["events_ctrl", "events_c", "e_c", "event_control", "e2", "events2"],
    ),
    ("mean_treatment", &["mean_exp", "mean_e", "m_t", "m1", "mean1"]),
    ("sd_treatment", &["sd_exp", "sd_e", "s_t", "sd1"]),
    ("mean_control", &["mean_ctrl", "mean_c", "m_c", "m2", "mean2"]),
    ("sd_control", &["sd_ctrl", "sd_c", "s_c", "sd2"]),
    ("effect_size", &["es", "effect", "te", "estimate"]),
    ("ci_lower", &["lower_ci", "ci_low", "lcl", "lower", "lower_bound"]),
    ("ci_upper", &["upper_ci", "ci_high", "ucl", "upper", "upper_bound"]),
    ("weight", &["w"]),
    ("quality_score", &["quality", "jadad", "nos", "rob_score"]),
];

/// Resolve a raw column name to its canonical field name.
///
/// Names are case-folded and have spaces/hyphens collapsed to underscores
/// before lookup. Returns `None` for columns the schema does not know.
pub fn canonical_field(raw: &str) -> Option<&'static str> {
    let folded = fold(raw);
    for (canonical, aliases) in ALIASES {
        if folded == *canonical || aliases.contains(&folded.as_str()) {
            return Some(canonical);
        }
    }
    None
}

/// Rewrite a row's keys onto canonical field names.
///
/// Unknown columns are dropped. When an alias and its canonical name are
/// both present, the canonical name wins.
pub fn normalize_row(row: &RawRow) -> RawRow {
    let mut out = RawRow::new();
    for (key, value) in row {
        let Some(canonical) = canonical_field(key) else {
            log::debug!("dropping unrecognized column '{}'", key);
            continue;
        };
        let is_canonical_key = fold(key) == canonical;
        if !out.contains_key(canonical) || is_canonical_key {
            out.insert(canonical.to_string(), value.clone());
        }
    }
    out
}

fn fold(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(canonical_field("n_exp"), Some("n_treatment"));
        assert_eq!(canonical_field("N_E"), Some("n_treatment"));
        assert_eq!(canonical_field("Treatment N"), Some("n_treatment"));
        assert_eq!(canonical_field("events-control"), Some("events_control"));
        assert_eq!(canonical_field("studlab"), Some("name"));
        assert_eq!(canonical_field("totally_unknown"), None);
    }

    #[test]
    fn test_canonical_names_are_fixed_points() {
        for (canonical, _) in ALIASES {
            assert_eq!(canonical_field(canonical), Some(*canonical));
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut row = RawRow::new();
        row.insert("Study Name".to_string(), Value::from("Trial A"));
        row.insert("n_exp".to_string(), Value::from(100));
        row.insert("events_e".to_string(), Value::from(15));
        row.insert("unknown_col".to_string(), Value::from("x"));

        let once = normalize_row(&row);
        let twice = normalize_row(&once);
        assert_eq!(once, twice);
        assert_eq!(once["name"], Value::from("Trial A"));
        assert_eq!(once["n_treatment"], Value::from(100));
        assert!(!once.contains_key("unknown_col"));
    }

    #[test]
    fn test_canonical_key_wins_over_alias() {
        let mut row = RawRow::new();
        row.insert("n_treatment".to_string(), Value::from(50));
        row.insert("n_exp".to_string(), Value::from(999));
        let normalized = normalize_row(&row);
        assert_eq!(normalized["n_treatment"], Value::from(50));
    }
}
