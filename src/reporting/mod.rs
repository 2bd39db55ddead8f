pub mod charts;
pub mod equivalence;
pub mod latex;
pub mod stats;

pub use stats::{descriptive_stats, observations, summary_by_condition, DescriptiveStats, Observation, Outcome};

use crate::config::ReportingConfig;
use crate::error::Result;
use crate::utils::io::read_table;
use equivalence::{read_equivalence_curve, AI_HUMAN_FILE, AI_NONE_FILE};
use log::{info, warn};
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "dv_summary_stats.txt";
pub const EQUIVALENCE_CHART_FILE: &str = "equivalence.png";

pub fn bar_chart_file(outcome: Outcome) -> String {
    format!("dv_{}_bar.png", outcome.name())
}

/// Files produced by one reporting run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportOutputs {
    pub participants: usize,
    pub summary_table: PathBuf,
    pub bar_charts: Vec<PathBuf>,
    pub equivalence_chart: Option<PathBuf>,
}

/// Writes the per-condition LaTeX summary of the cleaned table into
/// `results_dir`.
pub fn write_summary_table(cleaned: &DataFrame, results_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(results_dir)?;
    let path = results_dir.join(SUMMARY_FILE);
    let summary = summary_by_condition(cleaned)?;
    for (condition, cells) in &summary {
        info!("{}: {}", condition.code(), cells.join(" | "));
    }
    fs::write(&path, latex::summary_to_latex(&summary))?;
    info!("Saved summary table to {:?}", path);
    Ok(path)
}

/// Renders the equivalence chart when both precomputed curves are present.
fn render_equivalence(results_dir: &Path) -> Result<Option<PathBuf>> {
    let ai_human = results_dir.join(AI_HUMAN_FILE);
    let ai_none = results_dir.join(AI_NONE_FILE);
    if !ai_human.exists() || !ai_none.exists() {
        warn!(
            "Equivalence results not found in {:?}; skipping equivalence chart",
            results_dir
        );
        return Ok(None);
    }

    let left = read_equivalence_curve(&ai_human, "AI Label v. Human Label")?;
    let right = read_equivalence_curve(&ai_none, "AI Label v. No Label")?;
    let path = results_dir.join(EQUIVALENCE_CHART_FILE);
    charts::render_equivalence_chart(&left, &right, &path)?;
    Ok(Some(path))
}

pub fn run_report(config: &ReportingConfig) -> Result<ReportOutputs> {
    let cleaned = read_table(&config.cleaned_input, 0)?;
    let observations = observations(&cleaned)?;

    let stats = descriptive_stats(&cleaned, &observations)?;
    stats::log_descriptive_stats(&stats);

    let summary_table = write_summary_table(&cleaned, &config.results_dir)?;

    let mut bar_charts = Vec::with_capacity(Outcome::ALL.len());
    for outcome in Outcome::ALL {
        let panels = charts::bar_panels(&observations, outcome);
        let path = config.results_dir.join(bar_chart_file(outcome));
        charts::render_bar_chart(&panels, outcome, &path)?;
        bar_charts.push(path);
    }

    let equivalence_chart = render_equivalence(&config.results_dir)?;

    Ok(ReportOutputs {
        participants: stats.participants,
        summary_table,
        bar_charts,
        equivalence_chart,
    })
}
