//! Create command implementation

use anyhow::Result;

use crate::cli::{CreateArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{build_engine, print_json, print_session_summary};
use mp_core::{AnalysisParameters, EffectMeasure, PoolingModel};

/// Execute the create command
pub async fn execute(args: &CreateArgs, global: &GlobalArgs) -> Result<()> {
    let engine = build_engine(global)?;

    let measure: EffectMeasure = args.measure.parse()?;
    let model: PoolingModel = args.model.parse()?;
    let parameters = AnalysisParameters {
        effect_measure: measure,
        model,
        confidence_level: args.confidence,
        heterogeneity: !args.no_heterogeneity,
        bias_assessment: args.bias,
        sensitivity_analysis: args.sensitivity,
    };

    let session = engine.create_session(&args.name, parameters).await?;

    match args.output {
        OutputFormat::Json => print_json(&session)?,
        OutputFormat::Text => {
            print_session_summary(&session);
            println!();
            println!("Upload records with: mp upload {} <file>", session.id);
        }
    }
    Ok(())
}
