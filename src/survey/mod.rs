//! Survey domain types and the small set of `DataFrame` helpers the cleaning
//! and reporting stages share.
//!
//! Every table is read with all columns as strings. Missing cells are empty
//! strings, and rows are identified by the `ResponseId` column.
mod labels;

pub use labels::{Condition, PerceivedLabel, Topic};

use crate::error::{Result, SurveyError};
use polars::prelude::*;
use std::collections::HashSet;

/// Survey platform response id; identifies a participant row.
pub const RESPONSE_ID: &str = "ResponseId";

pub fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.get_column_index(name).is_some()
}

/// Fails on the first name that is not a column of `frame`.
pub fn require_columns<S: AsRef<str>>(frame: &DataFrame, names: &[S]) -> Result<()> {
    match names.iter().find(|name| !has_column(frame, name.as_ref())) {
        Some(missing) => Err(SurveyError::missing_column(missing.as_ref())),
        None => Ok(()),
    }
}

pub fn column_exprs<S: AsRef<str>>(names: &[S]) -> Vec<Expr> {
    names.iter().map(|name| col(name.as_ref())).collect()
}

/// Projection onto `names`, in the given order.
pub fn select_columns<S: AsRef<str>>(frame: &DataFrame, names: &[S]) -> Result<DataFrame> {
    require_columns(frame, names)?;
    Ok(frame.select(names.iter().map(|name| name.as_ref()))?)
}

fn series<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Series> {
    frame
        .column(name)
        .map(|column| column.as_materialized_series())
        .map_err(|_| SurveyError::missing_column(name))
}

/// Cells of one column as text, nulls as empty strings.
pub fn string_values(frame: &DataFrame, name: &str) -> Result<Vec<String>> {
    let values = series(frame, name)?.cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect())
}

/// Cells of one column as numbers; empty and non-numeric cells are `None`.
pub fn float_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = series(frame, name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

pub fn string_column(name: &str, values: Vec<String>) -> Column {
    Column::new(name.into(), values)
}

/// Errors with the first repeated value of `name`.
pub fn ensure_unique(frame: &DataFrame, name: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for value in string_values(frame, name)? {
        if !seen.insert(value.clone()) {
            return Err(SurveyError::DuplicateKey { key: value });
        }
    }
    Ok(())
}
