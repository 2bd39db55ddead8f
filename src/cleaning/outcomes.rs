use crate::cleaning::reshape::CleanedResponses;
use crate::error::Result;
use crate::survey::RESPONSE_ID;
use polars::prelude::*;

pub const DV_SUPPORT: &str = "dv_support";
pub const DV_CONFIDENCE: &str = "dv_confidence";
pub const DV_SHARING: &str = "dv_sharing";
pub const DV_ACCURACY: &str = "dv_accuracy";

pub const OUTCOME_COLUMNS: [&str; 4] = [DV_SUPPORT, DV_CONFIDENCE, DV_SHARING, DV_ACCURACY];

/// Empty and non-numeric cells become null.
fn number(name: &str) -> Expr {
    col(name).cast(DataType::Float64)
}

/// `ResponseId` plus the four float outcome columns. Support and confidence
/// are post-minus-pre changes; sharing and accuracy pass the post measure
/// through. A missing operand gives a null outcome.
pub fn derive_outcomes(responses: &CleanedResponses) -> Result<DataFrame> {
    let outcomes = responses
        .frame()
        .clone()
        .lazy()
        .select([
            col(RESPONSE_ID),
            (number("post_support") - number("pre_support")).alias(DV_SUPPORT),
            (number("post_confidence") - number("pre_confidence")).alias(DV_CONFIDENCE),
            number("post_sharing").alias(DV_SHARING),
            number("post_accuracy").alias(DV_ACCURACY),
        ])
        .collect()?;
    Ok(outcomes)
}
