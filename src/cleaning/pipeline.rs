use crate::cleaning::controls::{
    assigned_topics, label_manipulation_check, PASSED_MANIP, PERCEIVED_LABEL,
};
use crate::cleaning::filter::{filter_participants, PASSED_ATTC, STATUS};
use crate::cleaning::outcomes::{derive_outcomes, OUTCOME_COLUMNS};
use crate::cleaning::reshape::clean_responses;
use crate::config::CleaningConfig;
use crate::error::Result;
use crate::survey::{
    column_exprs, ensure_unique, has_column, select_columns, string_column, string_values,
    PerceivedLabel, RESPONSE_ID,
};
use crate::utils::io::{read_column_list, read_table, write_table_csv};
use log::{info, warn};
use polars::prelude::*;

pub const PROLIFIC_ID: &str = "PROLIFIC_PID";
pub const PARTICIPANT_ID: &str = "Participant id";

const JOIN_KEY: &str = "__participant";
const ROW_ORDER: &str = "__row";

/// Raw column names belonging to each logical group of the export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnGroups {
    pub controls: Vec<String>,
    pub metadata: Vec<String>,
    pub responses: Vec<String>,
    pub demographics: Vec<String>,
}

impl ColumnGroups {
    pub fn load(config: &CleaningConfig) -> Result<Self> {
        let groups = ColumnGroups {
            controls: read_column_list(&config.controls_columns_file())?,
            metadata: read_column_list(&config.metadata_columns_file())?,
            responses: read_column_list(&config.responses_columns_file())?,
            demographics: read_column_list(&config.demographics_columns_file())?,
        };
        info!(
            "Column groups: {} controls, {} metadata, {} responses, {} demographics",
            groups.controls.len(),
            groups.metadata.len(),
            groups.responses.len(),
            groups.demographics.len()
        );
        Ok(groups)
    }

    /// `ResponseId` followed by the export's controls, metadata and
    /// response columns.
    fn survey_columns(&self) -> Vec<String> {
        unique_columns(
            std::iter::once(RESPONSE_ID)
                .chain(self.controls.iter().map(String::as_str))
                .chain(self.metadata.iter().map(String::as_str))
                .chain(self.responses.iter().map(String::as_str)),
        )
    }

    /// Demographics columns carried over from the demographics export,
    /// including the join key and approval status.
    fn carried_demographics(&self) -> Vec<String> {
        unique_columns(
            self.demographics
                .iter()
                .map(String::as_str)
                .chain([PARTICIPANT_ID, STATUS]),
        )
    }

    fn controls_with_demographics(&self) -> Vec<String> {
        unique_columns(
            self.controls
                .iter()
                .chain(&self.demographics)
                .map(String::as_str),
        )
    }
}

/// Row counts after each stage; each is at most the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleaningSummary {
    pub raw_rows: usize,
    pub valid_rows: usize,
    pub attention_rows: usize,
    pub final_rows: usize,
}

/// Names in first-seen order with repeats removed.
fn unique_columns<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for name in names {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }
    columns
}

/// Inner join of the raw export with the demographics export on the Prolific
/// participant id. Rows keep the export's order; `ResponseId` stays unique.
pub fn merge_demographics(
    raw: &DataFrame,
    demographics: &DataFrame,
    groups: &ColumnGroups,
) -> Result<DataFrame> {
    ensure_unique(raw, RESPONSE_ID)?;

    let survey_columns = groups.survey_columns();
    let demographic_columns = groups.carried_demographics();
    let survey = select_columns(
        raw,
        &unique_columns(
            survey_columns
                .iter()
                .map(String::as_str)
                .chain([PROLIFIC_ID]),
        ),
    )?;
    let people = select_columns(demographics, &demographic_columns)?;

    let distinct_people = people
        .clone()
        .lazy()
        .filter(col(PARTICIPANT_ID).is_first_distinct())
        .with_column(col(PARTICIPANT_ID).alias(JOIN_KEY))
        .collect()?;
    let duplicates = people.height() - distinct_people.height();
    if duplicates > 0 {
        warn!(
            "{} duplicate demographics rows share a participant id; keeping the first of each",
            duplicates
        );
    }

    let output = unique_columns(
        survey_columns
            .iter()
            .chain(&demographic_columns)
            .map(String::as_str),
    );
    let merged = survey
        .lazy()
        .with_row_index(ROW_ORDER, None)
        .join(
            distinct_people.lazy(),
            [col(PROLIFIC_ID)],
            [col(JOIN_KEY)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort_by_exprs([col(ROW_ORDER)], Default::default())
        .select(column_exprs(&output))
        .collect()?;

    info!(
        "Merged {} of {} responses with demographics",
        merged.height(),
        raw.height()
    );
    Ok(merged)
}

/// Writes boolean flag columns as `True`/`False`.
fn flag_text(frame: DataFrame) -> Result<DataFrame> {
    let flags: Vec<Expr> = [PASSED_ATTC, PASSED_MANIP]
        .into_iter()
        .filter(|flag| has_column(&frame, flag))
        .map(|flag| {
            when(col(flag))
                .then(lit("True"))
                .otherwise(lit("False"))
                .alias(flag)
        })
        .collect();
    Ok(frame.lazy().with_columns(flags).collect()?)
}

/// Runs screening, reshaping, outcome derivation and row filtering over the
/// merged table. Returns the full cleaned table.
pub fn clean_merged(
    merged: &DataFrame,
    groups: &ColumnGroups,
    filter_manip: bool,
) -> Result<(DataFrame, CleaningSummary)> {
    let mut summary = CleaningSummary {
        raw_rows: merged.height(),
        ..CleaningSummary::default()
    };

    let screened = filter_participants(merged)?;
    summary.valid_rows = screened.height();

    let topics = assigned_topics(&screened)?;
    let screened = if filter_manip {
        label_manipulation_check(&screened)?
    } else {
        screened
    };

    let cleaned = clean_responses(&screened, &groups.responses, &topics)?;
    let outcomes = derive_outcomes(&cleaned)?;

    let mut carried = groups.controls_with_demographics();
    carried.push(PASSED_ATTC.to_string());
    if filter_manip {
        carried.push(PASSED_MANIP.to_string());
    }
    let carried = select_columns(&screened, &carried)?;
    let scores = select_columns(&outcomes, &OUTCOME_COLUMNS)?;
    let table = cleaned
        .into_frame()
        .hstack(carried.get_columns())?
        .hstack(scores.get_columns())?;

    let attentive = table.lazy().filter(col(PASSED_ATTC)).collect()?;
    summary.attention_rows = attentive.height();

    let kept = if filter_manip {
        attentive.lazy().filter(col(PASSED_MANIP)).collect()?
    } else {
        attentive
    };
    summary.final_rows = kept.height();

    info!(
        "Cleaning kept {} of {} rows ({} valid, {} attentive)",
        summary.final_rows, summary.raw_rows, summary.valid_rows, summary.attention_rows
    );
    Ok((flag_text(kept)?, summary))
}

/// Reduced column set for the external statistics tooling, with the
/// perceived-label rating recoded to its ordinal value.
pub fn stats_table<S: AsRef<str>>(cleaned: &DataFrame, columns: &[S]) -> Result<DataFrame> {
    let mut reduced = select_columns(cleaned, columns)?;
    if has_column(&reduced, PERCEIVED_LABEL) {
        let recoded = string_values(&reduced, PERCEIVED_LABEL)?
            .iter()
            .map(|value| PerceivedLabel::recode(value))
            .collect();
        reduced.with_column(string_column(PERCEIVED_LABEL, recoded))?;
    }
    Ok(reduced)
}

/// Loads every input named by `config`, cleans it and writes both outputs.
pub fn clean_survey(config: &CleaningConfig, filter_manip: bool) -> Result<CleaningSummary> {
    let groups = ColumnGroups::load(config)?;
    let raw = read_table(&config.raw_export, config.skipped_header_rows)?;
    let demographics = read_table(&config.demographics_export, 0)?;

    let merged = merge_demographics(&raw, &demographics, &groups)?;
    let (mut cleaned, summary) = clean_merged(&merged, &groups, filter_manip)?;

    write_table_csv(&mut cleaned, &config.cleaned_output)?;
    write_table_csv(
        &mut stats_table(&cleaned, config.stats_columns.as_slice())?,
        &config.stats_output,
    )?;
    Ok(summary)
}
