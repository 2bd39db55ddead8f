use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use persuasion_survey::config::{PipelineConfig, DEFAULT_CONFIG_PATH};
use persuasion_survey::{run_cleaning, run_generation, run_report, version};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "persuasion-survey", version, about = "Clean, generate and report on the persuasion survey")]
struct Cli {
    /// Pipeline configuration file; defaults apply when it is missing.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter, reshape and score the raw survey export.
    Clean {
        /// Also drop participants who failed the label manipulation check.
        #[arg(long)]
        filter_manip: bool,
    },
    /// Generate the persuasive statements shown to participants.
    Generate,
    /// Summary statistics and charts from the cleaned data.
    Report,
}

fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let cli = Cli::parse();
    info!("Persuasion survey pipeline v{}", version());

    let config = PipelineConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading configuration from {:?}", cli.config))?;

    let start_time = Instant::now();

    match cli.command {
        Command::Clean { filter_manip } => {
            let filter_manip = filter_manip || config.cleaning.filter_manip;
            let summary = run_cleaning(&config.cleaning, filter_manip).context("cleaning failed")?;
            info!(
                "Rows: {} raw, {} valid, {} attentive, {} kept",
                summary.raw_rows, summary.valid_rows, summary.attention_rows, summary.final_rows
            );
            info!("Output saved to: {:?}", config.cleaning.cleaned_output);
        }
        Command::Generate => {
            run_generation(&config.generation).context("content generation failed")?;
            info!("Output saved to: {:?}", config.generation.output);
        }
        Command::Report => {
            let outputs = run_report(&config.reporting).context("reporting failed")?;
            info!("Summary table saved to: {:?}", outputs.summary_table);
        }
    }

    info!("Completed in {:.2?}", start_time.elapsed());
    Ok(())
}
