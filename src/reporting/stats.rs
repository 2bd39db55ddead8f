use crate::cleaning::controls::{CONDITION, TOPIC};
use crate::cleaning::outcomes::OUTCOME_COLUMNS;
use crate::error::Result;
use crate::survey::{float_values, has_column, require_columns, string_values, Condition, Topic};
use log::{info, warn};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Derived outcome variable reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Support,
    Confidence,
    Sharing,
    Accuracy,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Support,
        Outcome::Confidence,
        Outcome::Sharing,
        Outcome::Accuracy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Confidence => "confidence",
            Self::Sharing => "sharing",
            Self::Accuracy => "accuracy",
        }
    }

    pub fn column(&self) -> &'static str {
        OUTCOME_COLUMNS[self.position()]
    }

    pub fn position(&self) -> usize {
        match self {
            Self::Support => 0,
            Self::Confidence => 1,
            Self::Sharing => 2,
            Self::Accuracy => 3,
        }
    }

    /// Support and confidence are pre/post changes.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Support | Self::Confidence)
    }

    pub fn axis_label(&self) -> String {
        let mut chars = self.name().chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        if self.is_change() {
            format!("Change in {}", capitalized)
        } else {
            capitalized
        }
    }
}

/// One retained participant as seen by the reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub condition: Condition,
    pub topic: Topic,
    pub outcomes: [Option<f64>; 4],
}

impl Observation {
    pub fn value(&self, outcome: Outcome) -> Option<f64> {
        self.outcomes[outcome.position()]
    }
}

/// Rows with an unknown condition or topic are skipped with a warning.
pub fn observations(frame: &DataFrame) -> Result<Vec<Observation>> {
    require_columns(frame, &[CONDITION, TOPIC])?;
    require_columns(frame, &OUTCOME_COLUMNS)?;

    let conditions = string_values(frame, CONDITION)?;
    let topics = string_values(frame, TOPIC)?;
    let outcomes = OUTCOME_COLUMNS
        .iter()
        .map(|column| float_values(frame, column))
        .collect::<Result<Vec<_>>>()?;

    let mut result = Vec::with_capacity(frame.height());
    let mut skipped = 0usize;
    for (row, (condition, topic)) in conditions.iter().zip(&topics).enumerate() {
        let (Some(condition), Some(topic)) = (Condition::parse(condition), Topic::parse(topic))
        else {
            skipped += 1;
            continue;
        };
        result.push(Observation {
            condition,
            topic,
            outcomes: std::array::from_fn(|position| outcomes[position][row]),
        });
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a recognised condition and topic", skipped);
    }
    Ok(result)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanSem {
    pub mean: f64,
    /// Sample standard deviation over √n; NaN for fewer than two values.
    pub sem: f64,
    pub n: usize,
}

impl MeanSem {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let sem = if n < 2 {
            f64::NAN
        } else {
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            (variance / n as f64).sqrt()
        };
        Some(Self { mean, sem, n })
    }

    /// Half-width of the normal-approximation 95% confidence interval.
    pub fn ci95(&self) -> f64 {
        if self.sem.is_finite() {
            1.96 * self.sem
        } else {
            0.0
        }
    }
}

/// `"{mean:.2} ± {sem:.2}"`, with `nan` for undefined parts.
pub fn format_mean_sem(mean: Option<f64>, sem: Option<f64>) -> String {
    let part = |value: Option<f64>| match value {
        Some(value) if value.is_finite() => format!("{:.2}", value),
        _ => "nan".to_string(),
    };
    format!("{} ± {}", part(mean), part(sem))
}

pub fn outcome_stats<'a, I>(observations: I, outcome: Outcome) -> Option<MeanSem>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let values: Vec<f64> = observations
        .into_iter()
        .filter_map(|obs| obs.value(outcome))
        .collect();
    MeanSem::of(&values)
}

fn aggregate_name(column: &str, statistic: &str) -> String {
    format!("{column}_{statistic}")
}

/// Formatted mean ± s.e. of every outcome, per condition, conditions in code
/// order. Rows with an unrecognised condition are left out; missing outcome
/// values are skipped.
pub fn summary_by_condition(frame: &DataFrame) -> Result<BTreeMap<Condition, [String; 4]>> {
    require_columns(frame, &[CONDITION])?;
    require_columns(frame, &OUTCOME_COLUMNS)?;

    let known = Condition::DISPLAY_ORDER
        .iter()
        .fold(lit(false), |acc, condition| {
            acc.or(col(CONDITION).eq(lit(condition.code())))
        });
    let aggregates: Vec<Expr> = OUTCOME_COLUMNS
        .iter()
        .flat_map(|column| {
            let value = col(*column).cast(DataType::Float64);
            [
                value.clone().mean().alias(aggregate_name(column, "mean")),
                value.clone().std(1).alias(aggregate_name(column, "std")),
                value.count().alias(aggregate_name(column, "n")),
            ]
        })
        .collect();

    let grouped = frame
        .clone()
        .lazy()
        .filter(known)
        .group_by([col(CONDITION)])
        .agg(aggregates)
        .collect()?;

    let conditions = string_values(&grouped, CONDITION)?;
    let mut cells: Vec<[String; 4]> = vec![Default::default(); grouped.height()];
    for (position, column) in OUTCOME_COLUMNS.iter().enumerate() {
        let means = float_values(&grouped, &aggregate_name(column, "mean"))?;
        let stds = float_values(&grouped, &aggregate_name(column, "std"))?;
        let counts = float_values(&grouped, &aggregate_name(column, "n"))?;
        for (row, cell) in cells.iter_mut().enumerate() {
            let sem = stds[row]
                .zip(counts[row])
                .map(|(std, n)| std / n.sqrt());
            cell[position] = format_mean_sem(means[row], sem);
        }
    }

    Ok(conditions
        .iter()
        .zip(cells)
        .filter_map(|(code, cells)| Condition::parse(code).map(|condition| (condition, cells)))
        .collect())
}

/// Share of each answer in a demographic column, largest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub column: String,
    pub shares: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DescriptiveStats {
    pub participants: usize,
    pub assignment: BTreeMap<(Condition, Topic), usize>,
    pub breakdowns: Vec<Breakdown>,
}

const BREAKDOWN_COLUMNS: [&str; 4] = ["RACEETH", "PARTY", "EDUC", "EXPERIENCE"];
const EDUCATION: &str = "EDUC";

fn collapse_education(value: &str) -> String {
    match value {
        "Bachelor degree" | "Master's degree" | "Professional or academic doctorate degree" => {
            "Bachelors+".to_string()
        }
        "Some college" | "2-year degree (e.g., associate degree)" => "Some college".to_string(),
        other => other.to_string(),
    }
}

pub fn breakdown(frame: &DataFrame, column: &str) -> Result<Breakdown> {
    let values = string_values(frame, column)?;
    let total = values.len();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        if value.trim().is_empty() {
            continue;
        }
        let label = if column == EDUCATION {
            collapse_education(&value)
        } else {
            value
        };
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut shares: Vec<(String, f64)> = counts
        .into_iter()
        .map(|(label, count)| (label, count as f64 / total as f64 * 100.0))
        .collect();
    shares.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(Breakdown {
        column: column.to_string(),
        shares,
    })
}

pub fn descriptive_stats(frame: &DataFrame, observations: &[Observation]) -> Result<DescriptiveStats> {
    let mut stats = DescriptiveStats {
        participants: frame.height(),
        ..DescriptiveStats::default()
    };

    for obs in observations {
        *stats
            .assignment
            .entry((obs.condition, obs.topic))
            .or_insert(0) += 1;
    }

    for column in BREAKDOWN_COLUMNS {
        if !has_column(frame, column) {
            warn!("Column {} not present; skipping its breakdown", column);
            continue;
        }
        stats.breakdowns.push(breakdown(frame, column)?);
    }
    Ok(stats)
}

pub fn log_descriptive_stats(stats: &DescriptiveStats) {
    info!("Number of participants: {}", stats.participants);
    info!("Condition assignment:");
    for ((condition, topic), count) in &stats.assignment {
        info!("  {:<5} topic {}: {}", condition.code(), topic, count);
    }
    for breakdown in &stats.breakdowns {
        info!("{} (% of participants):", breakdown.column);
        for (label, share) in &breakdown.shares {
            info!("  {:<45} {:>6.2}", label, share);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_standard_error() {
        let stat = MeanSem::of(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stat.mean, 2.5);
        // sd = sqrt(5/3), sem = sd / 2
        assert!((stat.sem - (5.0f64 / 3.0).sqrt() / 2.0).abs() < 1e-12);
        assert_eq!(stat.n, 4);

        assert!(MeanSem::of(&[]).is_none());
        assert!(MeanSem::of(&[3.0]).unwrap().sem.is_nan());
        assert_eq!(MeanSem::of(&[3.0]).unwrap().ci95(), 0.0);
    }

    #[test]
    fn formatted_as_mean_plus_minus_sem() {
        assert_eq!(format_mean_sem(Some(2.5), Some(0.6455)), "2.50 ± 0.65");
        assert_eq!(format_mean_sem(Some(1.0), None), "1.00 ± nan");
        assert_eq!(format_mean_sem(Some(1.0), Some(f64::NAN)), "1.00 ± nan");
        assert_eq!(format_mean_sem(None, None), "nan ± nan");
    }

    #[test]
    fn summary_groups_by_condition() {
        let frame = df!(
            CONDITION => ["LLM", "LLM", "NONE", "HUM", "HUM", "???"],
            TOPIC => ["1", "2", "3", "4", "4", "1"],
            "dv_support" => ["1", "3", "-1", "0.5", "0.5", "9"],
            "dv_confidence" => ["1", "1", "1", "1", "1", "9"],
            "dv_sharing" => ["2", "2", "2", "2", "2", "9"],
            "dv_accuracy" => ["", "", "4", "", "2", "9"]
        )
        .unwrap();
        let summary = summary_by_condition(&frame).unwrap();

        let order: Vec<&str> = summary.keys().map(|c| c.code()).collect();
        assert_eq!(order, vec!["HUM", "LLM", "NONE"]);

        let llm = &summary[&Condition::Llm];
        assert_eq!(llm[0], "2.00 ± 1.00");
        assert_eq!(llm[1], "1.00 ± 0.00");
        assert_eq!(llm[2], "2.00 ± 0.00");
        assert_eq!(llm[3], "nan ± nan");

        assert_eq!(summary[&Condition::Hum][3], "2.00 ± nan");
        assert_eq!(summary[&Condition::NoLabel][0], "-1.00 ± nan");
    }

    #[test]
    fn observations_skip_unknown_conditions() {
        let frame = df!(
            CONDITION => ["LLM", "nope", "HUM"],
            TOPIC => ["1", "2", "7"],
            "dv_support" => ["1.5", "1", "1"],
            "dv_confidence" => ["", "1", "1"],
            "dv_sharing" => ["2", "1", "1"],
            "dv_accuracy" => ["3.0", "1", "1"]
        )
        .unwrap();
        let observations = observations(&frame).unwrap();

        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].condition, Condition::Llm);
        assert_eq!(observations[0].outcomes, [Some(1.5), None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn axis_labels() {
        assert_eq!(Outcome::Support.axis_label(), "Change in Support");
        assert_eq!(Outcome::Sharing.axis_label(), "Sharing");
        assert_eq!(Outcome::Accuracy.column(), "dv_accuracy");
    }

    #[test]
    fn breakdowns_collapse_education() {
        let frame = df!(
            "EDUC" => ["Master's degree", "Bachelor degree", "Some college", "High school graduate"],
            "PARTY" => ["Democrat", "Republican", "Democrat", "Independent"]
        )
        .unwrap();

        let stats = descriptive_stats(&frame, &[]).unwrap();
        assert_eq!(stats.participants, 4);
        assert_eq!(stats.breakdowns.len(), 2);

        let party = &stats.breakdowns[0];
        assert_eq!(party.column, "PARTY");
        assert_eq!(party.shares[0], ("Democrat".to_string(), 50.0));

        let education = &stats.breakdowns[1];
        assert_eq!(education.shares[0], ("Bachelors+".to_string(), 50.0));
        assert_eq!(education.shares.len(), 3);
    }
}
