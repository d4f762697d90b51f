//! Script templates for the statistics runtime.
//!
//! Each operation materializes an R script from a shared prelude (which
//! rebuilds the pooled-analysis object from `input.json`) plus an
//! operation-specific tail. Only working-directory-relative paths are
//! substituted, so the same script runs bind-mounted in a container or
//! from a local interpreter. Ratio measures stay on the log scale in the
//! output file; the dispatcher back-transforms them.

use minijinja::{context, Environment};

use crate::dispatcher::Operation;
use crate::error::ExecResult;
use mp_core::layout::{OUTPUT_DIR, PROCESSING_DIR};

/// Well-known input file name inside `processing/`
pub const INPUT_FILE: &str = "input.json";

/// Well-known output file name inside `processing/`
pub const RESULTS_FILE: &str = "results.json";

const PRELUDE: &str = r#"#!/usr/bin/env Rscript
# Generated by metapool. Paths are relative to the session root.
suppressPackageStartupMessages({
  library(meta)
  library(jsonlite)
})

input <- fromJSON("{{ input_path }}", simplifyDataFrame = FALSE)
records <- input$records
sm <- input$effect_measure
use_random <- identical(input$model, "random")
conf_level <- input$confidence_level

num <- function(field) vapply(records, function(r) as.numeric(r[[field]]), numeric(1))
chr <- function(field) vapply(records, function(r) as.character(r[[field]]), character(1))
ci_method <- if (isTRUE(input$hartung_knapp)) "HK" else "classic"

if (sm %in% c("OR", "RR", "HR")) {
  m <- metabin(
    event.e = num("events_treatment"), n.e = num("n_treatment"),
    event.c = num("events_control"), n.c = num("n_control"),
    studlab = chr("name"), sm = sm, level = conf_level,
    common = !use_random, random = use_random,
    method.random.ci = ci_method
  )
} else {
  m <- metacont(
    n.e = num("n_treatment"), mean.e = num("mean_treatment"), sd.e = num("sd_treatment"),
    n.c = num("n_control"), mean.c = num("mean_control"), sd.c = num("sd_control"),
    studlab = chr("name"), sm = sm, level = conf_level,
    common = !use_random, random = use_random,
    method.random.ci = ci_method
  )
}

pick <- function(common_val, random_val) if (use_random) random_val else common_val
"#;

const COMPUTE_TAIL: &str = r#"
overall <- list(
  estimate = pick(m$TE.common, m$TE.random),
  ci_lower = pick(m$lower.common, m$lower.random),
  ci_upper = pick(m$upper.common, m$upper.random),
  p_value = pick(m$pval.common, m$pval.random),
  z_score = pick(m$statistic.common, m$statistic.random)
)

out <- list(overall = overall)

if (isTRUE(input$heterogeneity)) {
  out$heterogeneity <- list(
    i_squared = 100 * m$I2,
    q_statistic = m$Q,
    tau_squared = m$tau2,
    q_p_value = m$pval.Q
  )
}

weights <- pick(m$w.common, m$w.random)
weights <- 100 * weights / sum(weights)
out$contributions <- lapply(seq_along(records), function(i) list(
  record_id = records[[i]]$id,
  effect_size = m$TE[i],
  ci_lower = m$lower[i],
  ci_upper = m$upper[i],
  weight = weights[i]
))

if (isTRUE(input$bias_assessment) && length(records) >= 3) {
  egger <- metabias(m, method.bias = "linreg", k.min = 3)
  out$bias <- list(
    egger_intercept = unname(egger$estimate[1]),
    egger_p_value = egger$p.value
  )
}

write_json(out, "{{ output_path }}", auto_unbox = TRUE, null = "null", digits = NA)
"#;

const FOREST_TAIL: &str = r#"
png("{{ plot_path }}", width = 2400, height = 400 + 120 * length(records), res = 220)
forest(m)
invisible(dev.off())
"#;

const FUNNEL_TAIL: &str = r#"
png("{{ plot_path }}", width = 1800, height = 1800, res = 220)
funnel(m, studlab = TRUE)
invisible(dev.off())
"#;

/// Render the script for an operation, substituting the session-relative
/// input/output/artifact paths
pub fn render_script(operation: Operation) -> ExecResult<String> {
    let source = match operation {
        Operation::Compute => format!("{}{}", PRELUDE, COMPUTE_TAIL),
        Operation::ForestPlot => format!("{}{}", PRELUDE, FOREST_TAIL),
        Operation::FunnelPlot => format!("{}{}", PRELUDE, FUNNEL_TAIL),
    };

    let env = Environment::new();
    let rendered = env.render_str(
        &source,
        context! {
            input_path => format!("{}/{}", PROCESSING_DIR, INPUT_FILE),
            output_path => format!("{}/{}", PROCESSING_DIR, RESULTS_FILE),
            plot_path => operation
                .artifact()
                .map(|name| format!("{}/{}", OUTPUT_DIR, name)),
        },
    )?;
    Ok(rendered)
}
