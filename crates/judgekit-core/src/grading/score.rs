//! Score aggregation for one group.

use crate::grader::ScoreMode;

/// Aggregate child scores; `None` stands for a `NotRun` child.
///
/// `NotRun` counts as 0 for `sum` and `min`, and is left out of `max` and of
/// the `avg` denominator. An empty input (or no run children for
/// `max`/`avg`) yields 0.
pub fn aggregate_score(children: &[Option<f64>], mode: ScoreMode) -> f64 {
    if children.is_empty() {
        return 0.0;
    }
    let run: Vec<f64> = children.iter().flatten().copied().collect();
    match mode {
        ScoreMode::Sum => run.iter().sum(),
        ScoreMode::Min => children
            .iter()
            .map(|s| s.unwrap_or(0.0))
            .fold(f64::INFINITY, f64::min),
        ScoreMode::Max => run.iter().copied().reduce(f64::max).unwrap_or(0.0),
        ScoreMode::Avg => {
            if run.is_empty() {
                0.0
            } else {
                run.iter().sum::<f64>() / run.len() as f64
            }
        }
    }
}
