use serde::Serialize;

use crate::config::{CheckDefinition, Scoring};
use crate::results::ResultError;

/// Rounds to one decimal place, half away from zero.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Linear falloff from `full_score` at `lower` down to 0 at `upper`.
///
/// Fewer misses is better. A count at or below `lower` earns full credit and
/// a count at or above `upper` earns nothing, so `upper <= lower` never
/// reaches the division.
pub fn compute_score(measured: u64, lower: u64, upper: u64, full_score: f64) -> f64 {
    if measured <= lower {
        return full_score;
    }
    if measured >= upper {
        return 0.0;
    }

    let score = (measured - lower) as f64;
    let range = (upper - lower) as f64;
    round1((1.0 - score / range) * full_score)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub key: String,
    pub label: String,
    pub points: f64,
    pub max_points: u32,
    pub measured: u64,
}

impl ScoreRecord {
    /// Scores one check against the integers from the results line.
    pub fn grade(check: &CheckDefinition, counts: &[u64]) -> Result<Self, ResultError> {
        let measured = *counts
            .get(check.field)
            .ok_or_else(|| ResultError::MissingField {
                check: check.key.clone(),
                field: check.field,
                found: counts.len(),
            })?;

        let max = f64::from(check.max_points);
        let points = match check.scoring {
            Scoring::Misses { lower, upper } => compute_score(measured, lower, upper, max),
            Scoring::Reported => round1((measured as f64).min(max)),
        };

        Ok(Self {
            key: check.key.clone(),
            label: check.label.clone(),
            points,
            max_points: check.max_points,
            measured,
        })
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct FinalScore {
    pub points: f64,
    pub max_points: u32,
}

impl FinalScore {
    pub fn from_records(records: &[ScoreRecord]) -> Self {
        records.iter().fold(FinalScore::default(), |mut acc, r| {
            acc.points += r.points;
            acc.max_points += r.max_points;
            acc
        })
    }
}
