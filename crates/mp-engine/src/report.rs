//! Markdown report generation.
//!
//! Renders a summary of the session's parameters, records, pooled result,
//! and heterogeneity into `output/report.md`. Pure templating; the numbers
//! come straight from the stored result.

use minijinja::{context, Environment};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use mp_core::Session;

const REPORT_TEMPLATE: &str = r#"# Meta-analysis report: {{ session.name }}

- Session: `{{ session.id }}`
- Effect measure: {{ session.parameters.effect_measure }}
- Confidence level: {{ (session.parameters.confidence_level * 100) | round(1) }}%
- Model: {{ results.model.kind }}{% if results.model.hartung_knapp %} (Hartung-Knapp){% endif %}
- Records pooled: {{ results.model.record_count }}
- Computed at: {{ results.computed_at }}

## Pooled effect

| Estimate | CI lower | CI upper | z | p-value |
|---------:|---------:|---------:|--:|--------:|
| {{ results.overall.estimate | round(4) }} | {{ results.overall.ci_lower | round(4) }} | {{ results.overall.ci_upper | round(4) }} | {{ results.overall.z_score | round(3) }} | {{ results.overall.p_value | round(4) }} |
{% if results.heterogeneity %}
## Heterogeneity

| I² (%) | Q | τ² | Q p-value |
|-------:|--:|---:|----------:|
| {{ results.heterogeneity.i_squared | round(1) }} | {{ results.heterogeneity.q_statistic | round(3) }} | {{ results.heterogeneity.tau_squared | round(4) }} | {{ results.heterogeneity.q_p_value | round(4) }} |
{% endif %}{% if results.contributions %}
## Study contributions

| Record | Effect | CI lower | CI upper | Weight (%) |
|--------|-------:|---------:|---------:|-----------:|
{% for c in results.contributions -%}
| {{ c.record_id }} | {{ c.effect_size | round(4) }} | {{ c.ci_lower | round(4) }} | {{ c.ci_upper | round(4) }} | {{ c.weight | round(1) }} |
{% endfor %}{% endif %}{% if results.bias %}
## Publication bias

{% if results.bias.egger_intercept is not none %}- Egger intercept: {{ results.bias.egger_intercept | round(4) }}{% endif %}
{% if results.bias.egger_p_value is not none %}- Egger p-value: {{ results.bias.egger_p_value | round(4) }}{% endif %}
{% endif %}
## Evidence base

{{ session.records | length }} validated record(s) across {{ session.files.uploaded | length }} upload(s).
"#;

/// Render the report for a session with stored results
pub fn render_report(
    session: &Session,
    vars: &HashMap<String, serde_yaml::Value>,
) -> EngineResult<String> {
    let results = session.results.as_ref().ok_or_else(|| EngineError::NoResults {
        id: session.id.clone(),
    })?;

    let env = Environment::new();
    env.render_str(
        REPORT_TEMPLATE,
        context! {
            session => session,
            results => results,
            vars => vars,
        },
    )
    .map_err(|e| EngineError::Report {
        message: e.to_string(),
    })
}
