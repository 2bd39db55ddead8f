use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SurveyError};

pub const DEFAULT_CONFIG_PATH: &str = "survey.toml";

const DATASET: &str = "LLM-Persuasion-FINAL-July1";

/// Columns handed to the external statistics tooling, in output order.
pub const DEFAULT_STATS_COLUMNS: [&str; 18] = [
    "pre_support",
    "post_support",
    "pre_confidence",
    "post_confidence",
    "post_sharing",
    "post_accuracy",
    "topic",
    "condition",
    "pre_knowledge",
    "EXPERIENCE",
    "EDUC",
    "PARTY",
    "Age",
    "Sex",
    "Ethnicity simplified",
    "Nationality",
    "LLM_HUMAN_2",
    "LLM_HUMAN_3",
];

/// Settings for all three stages, loaded from `survey.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    pub reporting: ReportingConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleaningConfig {
    pub raw_export: PathBuf,
    pub demographics_export: PathBuf,
    pub columns_dir: PathBuf,
    /// Descriptive rows between the header line and the first response.
    pub skipped_header_rows: usize,
    pub filter_manip: bool,
    pub cleaned_output: PathBuf,
    pub stats_output: PathBuf,
    pub stats_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportingConfig {
    pub cleaned_input: PathBuf,
    pub results_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cleaning: CleaningConfig::default(),
            reporting: ReportingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            raw_export: PathBuf::from(format!("data/raw/{DATASET}.csv")),
            demographics_export: PathBuf::from(format!("data/raw/{DATASET}_demographics.csv")),
            columns_dir: PathBuf::from(format!("data/columns/{DATASET}")),
            skipped_header_rows: 2,
            filter_manip: false,
            cleaned_output: PathBuf::from(format!("data/{DATASET}_cleaned.csv")),
            stats_output: PathBuf::from(format!("data/{DATASET}_R.csv")),
            stats_columns: DEFAULT_STATS_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            cleaned_input: PathBuf::from(format!("data/{DATASET}_cleaned.csv")),
            results_dir: PathBuf::from("results"),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("information_content.csv"),
        }
    }
}

impl CleaningConfig {
    pub fn controls_columns_file(&self) -> PathBuf {
        self.columns_dir.join("columns_controls.txt")
    }

    pub fn metadata_columns_file(&self) -> PathBuf {
        self.columns_dir.join("columns_metadata.txt")
    }

    pub fn responses_columns_file(&self) -> PathBuf {
        self.columns_dir.join("columns_responses.txt")
    }

    pub fn demographics_columns_file(&self) -> PathBuf {
        self.columns_dir.join("columns_demographics.txt")
    }
}

impl PipelineConfig {
    pub fn from_toml_str(data: &str) -> Result<Self> {
        toml::from_str(data).map_err(|err| SurveyError::Config(err.to_string()))
    }

    /// Reads the config file, falling back to defaults when it is absent.
    /// A file that exists but fails to parse is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(data) => {
                info!("Loaded pipeline configuration from {:?}", path);
                Self::from_toml_str(&data)
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to defaults.",
                    path, err
                );
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [cleaning]
            filter_manip = true
            raw_export = "in/export.csv"

            [reporting]
            results_dir = "out"
            "#,
        )
        .unwrap();

        assert!(config.cleaning.filter_manip);
        assert_eq!(config.cleaning.raw_export, PathBuf::from("in/export.csv"));
        assert_eq!(config.cleaning.skipped_header_rows, 2);
        assert_eq!(config.cleaning.stats_columns.len(), DEFAULT_STATS_COLUMNS.len());
        assert_eq!(config.reporting.results_dir, PathBuf::from("out"));
        assert_eq!(config.generation, GenerationConfig::default());
    }

    #[test]
    fn malformed_file_is_rejected() {
        let err = PipelineConfig::from_toml_str("[cleaning]\nfilter_manip = \"yes\"").unwrap_err();
        assert!(matches!(err, SurveyError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = PipelineConfig::load_or_default(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn column_files_live_in_columns_dir() {
        let cleaning = CleaningConfig {
            columns_dir: PathBuf::from("cols"),
            ..CleaningConfig::default()
        };
        assert_eq!(
            cleaning.responses_columns_file(),
            PathBuf::from("cols/columns_responses.txt")
        );
    }
}
