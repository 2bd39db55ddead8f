use crate::error::Result;
use crate::survey::require_columns;
use log::info;
use polars::prelude::*;

pub const WORKER_ID: &str = "WORKERID";
pub const PROGRESS: &str = "Progress";
pub const FINISHED: &str = "Finished";
pub const CONSENT: &str = "CONSENT_SELECT";
pub const DEBRIEF: &str = "DEBRIEF";
pub const STATUS: &str = "Status";
pub const ATTENTION_CHECK: &str = "ATTC";
pub const PASSED_ATTC: &str = "passed_attc";

/// Columns the screen reads.
pub const SCREENED_COLUMNS: [&str; 7] = [
    WORKER_ID,
    PROGRESS,
    FINISHED,
    CONSENT,
    DEBRIEF,
    STATUS,
    ATTENTION_CHECK,
];

const TEST_WORKER: &str = "test";
const TRUE_FLAGS: [&str; 4] = ["True", "true", "TRUE", "1"];
const CONSENT_AGREED: &str = "I agree to participate in this research.";
const DEBRIEF_CONFIRMED: &str = "I confirm my consent to participate in this research.";
const STATUS_APPROVED: &str = "APPROVED";
const ATTENTION_CHECK_ANSWER: &str = "Online sources only,About half online sources";

/// True for complete, consenting, approved, non-test submissions.
pub fn validity_mask() -> Expr {
    let finished = TRUE_FLAGS
        .iter()
        .fold(lit(false), |acc, flag| acc.or(col(FINISHED).eq(lit(*flag))));

    col(WORKER_ID)
        .neq(lit(TEST_WORKER))
        .and(col(PROGRESS).cast(DataType::Float64).eq(lit(100.0)))
        .and(finished)
        .and(col(CONSENT).eq(lit(CONSENT_AGREED)))
        .and(col(DEBRIEF).eq(lit(DEBRIEF_CONFIRMED)))
        .and(col(STATUS).eq(lit(STATUS_APPROVED)))
}

pub fn attention_mask() -> Expr {
    col(ATTENTION_CHECK).eq(lit(ATTENTION_CHECK_ANSWER))
}

/// Keeps valid participants in input order and flags each with a boolean
/// `passed_attc`. Applying it to its own output changes nothing.
pub fn filter_participants(table: &DataFrame) -> Result<DataFrame> {
    require_columns(table, &SCREENED_COLUMNS)?;

    let screened = table
        .clone()
        .lazy()
        .filter(validity_mask())
        .with_column(attention_mask().alias(PASSED_ATTC))
        .collect()?;

    info!(
        "{} of {} participants passed validity screening",
        screened.height(),
        table.height()
    );
    Ok(screened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::string_values;

    const KEY: &str = "ResponseId";

    fn table_with(rows: &[(&str, usize, &str)]) -> DataFrame {
        let valid = [
            "w-17",
            "100",
            "True",
            CONSENT_AGREED,
            DEBRIEF_CONFIRMED,
            STATUS_APPROVED,
            ATTENTION_CHECK_ANSWER,
        ];
        let mut columns = vec![Column::new(
            KEY.into(),
            rows.iter().map(|(key, _, _)| *key).collect::<Vec<_>>(),
        )];
        for (position, name) in SCREENED_COLUMNS.iter().enumerate() {
            let cells: Vec<&str> = rows
                .iter()
                .map(|&(_, changed, value)| if changed == position { value } else { valid[position] })
                .collect();
            columns.push(Column::new((*name).into(), cells));
        }
        DataFrame::new(columns).unwrap()
    }

    fn keys(frame: &DataFrame) -> Vec<String> {
        string_values(frame, KEY).unwrap()
    }

    #[test]
    fn complete_consenting_participant_is_retained() {
        let screened = filter_participants(&table_with(&[("R_ok", usize::MAX, "")])).unwrap();
        assert_eq!(keys(&screened), vec!["R_ok"]);
        assert_eq!(
            string_values(&screened, PASSED_ATTC).unwrap(),
            vec!["true"]
        );
    }

    #[test]
    fn each_predicate_excludes() {
        let table = table_with(&[
            ("R_test", 0, "test"),
            ("R_partial", 1, "80"),
            ("R_unfinished", 2, "False"),
            ("R_noconsent", 3, "I do not agree to participate in this research."),
            ("R_nodebrief", 4, ""),
            ("R_rejected", 5, "RETURNED"),
            ("R_float", 1, "100.0"),
            ("R_blank", 1, ""),
        ]);
        let screened = filter_participants(&table).unwrap();
        assert_eq!(keys(&screened), vec!["R_float"]);
    }

    #[test]
    fn attention_check_is_flagged_not_filtered() {
        let table = table_with(&[
            ("R_partial", 1, "80"),
            ("R_inattentive", 6, "Online sources only"),
            ("R_attentive", usize::MAX, ""),
        ]);
        let screened = filter_participants(&table).unwrap();
        assert_eq!(keys(&screened), vec!["R_inattentive", "R_attentive"]);

        let flags: Vec<Option<bool>> = screened
            .column(PASSED_ATTC)
            .unwrap()
            .as_materialized_series()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(flags, vec![Some(false), Some(true)]);
    }

    #[test]
    fn screening_is_idempotent() {
        let table = table_with(&[
            ("R_1", usize::MAX, ""),
            ("R_2", 1, "50"),
            ("R_3", usize::MAX, ""),
            ("R_4", 5, "TIMED-OUT"),
        ]);
        let first = filter_participants(&table).unwrap();
        let second = filter_participants(&first).unwrap();
        assert_eq!(keys(&second), keys(&first));
        assert_eq!(second.height(), 2);
    }

    #[test]
    fn missing_screen_column_is_an_error() {
        let table = table_with(&[("R_1", usize::MAX, "")]).drop(STATUS).unwrap();
        assert!(filter_participants(&table).is_err());
    }
}
