pub mod cleaning;
pub mod config;
pub mod error;
pub mod generation;
pub mod reporting;
pub mod survey;
pub mod utils;

use config::{CleaningConfig, GenerationConfig, ReportingConfig};
use error::Result;
use generation::{GeneratedContent, OpenAiClient, OpenAiConfig};
use log::{debug, info};

pub use cleaning::CleaningSummary;
pub use error::SurveyError;
pub use reporting::ReportOutputs;

/// Cleans the raw export. `filter_manip` also drops participants failing
/// the label manipulation check.
pub fn run_cleaning(config: &CleaningConfig, filter_manip: bool) -> Result<CleaningSummary> {
    info!("Starting survey cleaning");
    debug!(
        "Raw export: {:?}, demographics: {:?}, filter_manip: {}",
        config.raw_export, config.demographics_export, filter_manip
    );

    let summary = cleaning::clean_survey(config, filter_manip)?;

    info!(
        "Cleaning complete: {} participants written to {:?}",
        summary.final_rows, config.cleaned_output
    );
    Ok(summary)
}

/// Generates the persuasive statements with the OpenAI chat API. The API
/// key is read from the environment, optionally through a `.env` file.
pub fn run_generation(config: &GenerationConfig) -> Result<Vec<GeneratedContent>> {
    dotenvy::dotenv().ok();
    let client = OpenAiClient::new(OpenAiConfig::from_env()?)?;

    info!("Generating information content with model {}", client.model());
    let contents = generation::generate_information(&client, &config.output)?;

    info!("Generation complete: {} statements", contents.len());
    Ok(contents)
}

pub fn run_report(config: &ReportingConfig) -> Result<ReportOutputs> {
    info!("Starting report for {:?}", config.cleaned_input);
    let outputs = reporting::run_report(config)?;
    info!(
        "Report complete: {} participants, {} charts written to {:?}",
        outputs.participants,
        outputs.bar_charts.len() + usize::from(outputs.equivalence_chart.is_some()),
        config.results_dir
    );
    Ok(outputs)
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
