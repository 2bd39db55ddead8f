use crate::error::{Result, SurveyError};
use log::{error, info};
use serde::Deserialize;
use std::path::Path;

pub const AI_HUMAN_FILE: &str = "equivalence_test_ai_human.csv";
pub const AI_NONE_FILE: &str = "equivalence_test_ai_none.csv";

/// One point of a precomputed TOST curve: p-values of the two one-sided
/// tests at a given equivalence bound.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EquivalencePoint {
    pub equivalence_bound: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceCurve {
    pub title: &'static str,
    pub points: Vec<EquivalencePoint>,
}

impl EquivalenceCurve {
    pub fn bound_range(&self) -> Option<(f64, f64)> {
        let mut bounds = self.points.iter().map(|p| p.equivalence_bound);
        let first = bounds.next()?;
        Some(bounds.fold((first, first), |(lo, hi), b| (lo.min(b), hi.max(b))))
    }
}

/// Reads a curve and sorts it by equivalence bound. Extra columns are ignored.
pub fn read_equivalence_curve(path: &Path, title: &'static str) -> Result<EquivalenceCurve> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        error!("Failed to open equivalence results {:?}: {}", path, e);
        SurveyError::Csv(e)
    })?;

    let mut points = reader
        .deserialize::<EquivalencePoint>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    points.sort_by(|a, b| a.equivalence_bound.total_cmp(&b.equivalence_bound));

    info!("Read {} equivalence points from {:?}", points.len(), path);
    Ok(EquivalenceCurve { title, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_and_sorts_curve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AI_HUMAN_FILE);
        fs::write(
            &path,
            ",equivalence_bound,lower_bound,upper_bound\n\
             0,0.2,0.01,0.03\n\
             1,0.1,0.20,0.40\n\
             2,0.3,0.001,0.002\n",
        )
        .unwrap();

        let curve = read_equivalence_curve(&path, "AI Label v. Human Label").unwrap();
        let bounds: Vec<f64> = curve.points.iter().map(|p| p.equivalence_bound).collect();
        assert_eq!(bounds, vec![0.1, 0.2, 0.3]);
        assert_eq!(curve.points[0].upper_bound, 0.40);
        assert_eq!(curve.bound_range(), Some((0.1, 0.3)));
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AI_NONE_FILE);
        fs::write(&path, "equivalence_bound,lower_bound\n0.1,0.2\n").unwrap();
        assert!(read_equivalence_curve(&path, "AI Label v. No Label").is_err());
    }
}
