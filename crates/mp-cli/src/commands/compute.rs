//! Compute command implementation

use anyhow::Result;

use crate::cli::{ComputeArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{build_engine, job_spinner, print_json};
use mp_core::PoolingModel;
use mp_engine::ComputeOptions;

/// Execute the compute command
pub async fn execute(args: &ComputeArgs, global: &GlobalArgs) -> Result<()> {
    let engine = build_engine(global)?;

    let options = ComputeOptions {
        model: args
            .model
            .as_deref()
            .map(str::parse::<PoolingModel>)
            .transpose()?,
        confidence_level: args.confidence,
    };

    let spinner = job_spinner("Running pooled analysis...");
    let outcome = engine.compute(&args.session, &options).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    for warning in &outcome.warnings {
        eprintln!("[warn] {}", warning);
    }

    match (&outcome.result, args.output) {
        (Some(result), OutputFormat::Json) => print_json(result)?,
        (Some(result), OutputFormat::Text) => {
            println!(
                "Computed session {} on {} backend",
                outcome.session.id, outcome.backend
            );
            println!(
                "  pooled {}: {:.4} [{:.4}, {:.4}]",
                outcome.session.parameters.effect_measure,
                result.overall.estimate,
                result.overall.ci_lower,
                result.overall.ci_upper
            );
            println!(
                "  model: {}{}  records: {}",
                result.model.kind,
                if result.model.hartung_knapp {
                    " (Hartung-Knapp)"
                } else {
                    ""
                },
                result.model.record_count
            );
            println!(
                "  z = {:.3}, p = {:.4}",
                result.overall.z_score, result.overall.p_value
            );
            if let Some(het) = &result.heterogeneity {
                println!(
                    "  heterogeneity: I\u{b2} = {:.1}%, Q = {:.3} (p = {:.4}), \u{3c4}\u{b2} = {:.4}",
                    het.i_squared, het.q_statistic, het.q_p_value, het.tau_squared
                );
            }
        }
        (None, _) => {
            // Exit zero but no results.json: show what the runtime said
            eprintln!("[warn] runtime produced no structured results; raw output follows");
            if let Some(raw) = &outcome.raw_output {
                println!("{}", raw);
            }
        }
    }
    Ok(())
}
