use crate::error::{Result, SurveyError};
use crate::survey::{require_columns, string_column, string_values, Topic, RESPONSE_ID};
use log::{debug, info, warn};
use polars::prelude::*;

/// Survey items asked once per topic.
pub const ITEMS_PER_TOPIC: usize = 10;

/// Names given to the ten items of the selected block, in column order.
pub const BLOCK_FIELDS: [&str; ITEMS_PER_TOPIC] = [
    "pre_knowledge",
    "pre_support",
    "pre_confidence",
    "expert",
    "expert_no_label",
    "confirm_read",
    "post_support",
    "post_confidence",
    "post_sharing",
    "post_accuracy",
];

/// Manipulation-check items that are not outcome variables.
pub const DROPPED_FIELDS: [&str; 3] = ["expert", "expert_no_label", "confirm_read"];

/// Columns of the reshaped response table.
pub const RESPONSE_FIELDS: [&str; 7] = [
    "pre_knowledge",
    "pre_support",
    "pre_confidence",
    "post_support",
    "post_confidence",
    "post_sharing",
    "post_accuracy",
];

/// Response table after topic-block selection: `ResponseId` followed by
/// [`RESPONSE_FIELDS`]. Only [`clean_responses`] builds one, so anything
/// derived from it has been reshaped first.
#[derive(Debug, Clone)]
pub struct CleanedResponses {
    frame: DataFrame,
}

impl CleanedResponses {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }
}

/// Splits `response_columns` into one block of ten per topic.
pub fn group_response_columns(response_columns: &[String]) -> Result<Vec<&[String]>> {
    let expected = ITEMS_PER_TOPIC * Topic::COUNT;
    if response_columns.len() != expected {
        return Err(SurveyError::ColumnLayout {
            expected,
            found: response_columns.len(),
        });
    }
    Ok(response_columns.chunks(ITEMS_PER_TOPIC).collect())
}

/// Picks each participant's topic block out of the flat response columns and
/// relabels it with [`BLOCK_FIELDS`], dropping [`DROPPED_FIELDS`].
///
/// `topics` holds one entry per row of `responses`, in row order.
pub fn clean_responses(
    responses: &DataFrame,
    response_columns: &[String],
    topics: &[Topic],
) -> Result<CleanedResponses> {
    let groups = group_response_columns(response_columns)?;
    require_columns(responses, response_columns)?;

    let keys = string_values(responses, RESPONSE_ID)?;
    if let Some(key) = keys.get(topics.len()) {
        return Err(SurveyError::InvalidTopic {
            key: key.clone(),
            value: String::new(),
        });
    }

    // cells[block][item][row]
    let cells = groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|column| string_values(responses, column))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let kept: Vec<usize> = BLOCK_FIELDS
        .iter()
        .enumerate()
        .filter(|(_, field)| !DROPPED_FIELDS.contains(*field))
        .map(|(item, _)| item)
        .collect();

    let mut fields = vec![Vec::with_capacity(keys.len()); kept.len()];
    let mut leaking = 0usize;

    for (row, (key, topic)) in keys.iter().zip(topics).enumerate() {
        let block = &cells[topic.index()];
        for (field, &item) in fields.iter_mut().zip(&kept) {
            field.push(block[item][row].clone());
        }

        let other_answers = cells
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != topic.index())
            .flat_map(|(_, items)| items.iter())
            .any(|item| !item[row].trim().is_empty());
        if other_answers {
            debug!("Participant {} has answers outside topic block {}", key, topic);
            leaking += 1;
        }
    }

    if leaking > 0 {
        warn!(
            "{} participants have answers outside their assigned topic block; those answers are ignored",
            leaking
        );
    }

    let mut columns = vec![string_column(RESPONSE_ID, keys)];
    columns.extend(
        RESPONSE_FIELDS
            .iter()
            .zip(fields)
            .map(|(name, values)| string_column(name, values)),
    );
    let frame = DataFrame::new(columns)?;
    info!("Reshaped responses for {} participants", frame.height());

    Ok(CleanedResponses { frame })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_columns() -> Vec<String> {
        (1..=Topic::COUNT)
            .flat_map(|topic| (1..=ITEMS_PER_TOPIC).map(move |item| format!("T{topic}_Q{item}")))
            .collect()
    }

    /// One row per `(key, answered_topic)`; the answered block holds
    /// `"{block}.{item}"` and every other cell is blank.
    fn responses(rows: &[(&str, usize)]) -> DataFrame {
        let mut columns = vec![string_column(
            RESPONSE_ID,
            rows.iter().map(|(key, _)| key.to_string()).collect(),
        )];
        for (position, name) in response_columns().iter().enumerate() {
            let block = position / ITEMS_PER_TOPIC + 1;
            let item = position % ITEMS_PER_TOPIC + 1;
            let values = rows
                .iter()
                .map(|&(_, topic)| {
                    if topic == block {
                        format!("{block}.{item}")
                    } else {
                        String::new()
                    }
                })
                .collect();
            columns.push(string_column(name, values));
        }
        DataFrame::new(columns).unwrap()
    }

    fn topics(numbers: &[u8]) -> Vec<Topic> {
        numbers.iter().map(|n| Topic::new(*n).unwrap()).collect()
    }

    #[test]
    fn selects_block_matching_topic() {
        let frame = responses(&[("R_1", 1), ("R_2", 2), ("R_3", 3), ("R_4", 4)]);
        let cleaned = clean_responses(&frame, &response_columns(), &topics(&[1, 2, 3, 4])).unwrap();
        let cleaned = cleaned.frame();

        assert_eq!(cleaned.height(), 4);
        assert_eq!(cleaned.width(), RESPONSE_FIELDS.len() + 1);
        assert_eq!(
            string_values(cleaned, RESPONSE_ID).unwrap(),
            vec!["R_1", "R_2", "R_3", "R_4"]
        );

        assert_eq!(
            string_values(cleaned, "pre_knowledge").unwrap(),
            vec!["1.1", "2.1", "3.1", "4.1"]
        );
        assert_eq!(string_values(cleaned, "post_support").unwrap()[2], "3.7");
        assert_eq!(string_values(cleaned, "post_accuracy").unwrap()[2], "3.10");
        for dropped in DROPPED_FIELDS {
            assert!(cleaned.column(dropped).is_err());
        }
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        let columns: Vec<String> = response_columns().into_iter().take(30).collect();
        let frame = responses(&[("R_1", 1)]);
        let err = clean_responses(&frame, &columns, &topics(&[1])).unwrap_err();
        assert!(matches!(
            err,
            SurveyError::ColumnLayout {
                expected: 40,
                found: 30
            }
        ));
    }

    #[test]
    fn participant_without_topic_is_rejected() {
        let frame = responses(&[("R_1", 1), ("R_x", 2)]);
        let err = clean_responses(&frame, &response_columns(), &topics(&[1])).unwrap_err();
        assert!(matches!(err, SurveyError::InvalidTopic { key, .. } if key == "R_x"));
    }

    #[test]
    fn answers_in_other_blocks_do_not_leak() {
        let frame = responses(&[("R_1", 1)])
            .lazy()
            .with_column(lit("99").alias("T2_Q2"))
            .collect()
            .unwrap();

        let cleaned = clean_responses(&frame, &response_columns(), &topics(&[1])).unwrap();
        assert_eq!(
            string_values(cleaned.frame(), "pre_support").unwrap(),
            vec!["1.2"]
        );
    }
}
