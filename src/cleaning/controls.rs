use crate::error::{Result, SurveyError};
use crate::survey::{require_columns, string_values, Condition, Topic, RESPONSE_ID};
use log::info;
use polars::prelude::*;

pub const CONDITION: &str = "condition";
pub const TOPIC: &str = "topic";
/// "Was the text written by a human or an AI?" on a five-point scale.
pub const PERCEIVED_LABEL: &str = "LLM_HUMAN_2";
/// Follow-up asking whether the participant was confident in that rating.
pub const LABEL_CONFIDENCE: &str = "LLM_HUMAN_3";
pub const PASSED_MANIP: &str = "passed_manip";

const NOT_CONFIDENT: &str = "No";

/// Parses the `topic` cell of every row, in row order, failing on the first
/// value that is not one of the four topics.
pub fn assigned_topics(controls: &DataFrame) -> Result<Vec<Topic>> {
    let keys = string_values(controls, RESPONSE_ID)?;
    let topics = string_values(controls, TOPIC)?;

    keys.into_iter()
        .zip(topics)
        .map(|(key, raw)| {
            Topic::parse(&raw).ok_or(SurveyError::InvalidTopic { key, value: raw })
        })
        .collect()
}

/// True when the participant saw no label, recognised the label they saw,
/// or said they were not confident in their rating.
pub fn manipulation_mask() -> Expr {
    let recognised = Condition::DISPLAY_ORDER
        .iter()
        .filter_map(|condition| condition.expected_perception().map(|label| (condition, label)))
        .fold(lit(false), |acc, (condition, label)| {
            acc.or(col(CONDITION)
                .eq(lit(condition.code()))
                .and(col(PERCEIVED_LABEL).eq(lit(label.text()))))
        });

    col(CONDITION)
        .eq(lit(Condition::NoLabel.code()))
        .or(recognised)
        .or(col(LABEL_CONFIDENCE).eq(lit(NOT_CONFIDENT)))
}

/// Appends a boolean `passed_manip` column.
pub fn label_manipulation_check(controls: &DataFrame) -> Result<DataFrame> {
    require_columns(controls, &[CONDITION, PERCEIVED_LABEL, LABEL_CONFIDENCE])?;

    let labeled = controls
        .clone()
        .lazy()
        .with_column(manipulation_mask().alias(PASSED_MANIP))
        .collect()?;

    let passed = labeled
        .column(PASSED_MANIP)?
        .as_materialized_series()
        .bool()?
        .sum()
        .unwrap_or(0);
    info!(
        "{} of {} participants passed the manipulation check",
        passed,
        labeled.height()
    );
    Ok(labeled)
}
