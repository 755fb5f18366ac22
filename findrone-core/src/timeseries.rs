//! Mean coverage over repeated runs that share one time base.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::numbers::count_to_f64;

/// Absolute tolerance when checking that runs share a time base.
pub const TIME_BASE_TOLERANCE: f64 = 1e-8;

/// Errors raised when runs cannot be averaged.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("no coverage series to average")]
    NoSeries,
    #[error("run {run}: {time_len} timestamps but {value_len} coverage values")]
    LengthMismatch {
        run: usize,
        time_len: usize,
        value_len: usize,
    },
    #[error("run {run} has {actual} samples, expected {expected}")]
    RunLengthMismatch {
        run: usize,
        expected: usize,
        actual: usize,
    },
    #[error(
        "time vectors differ across runs; cannot average directly (run {run}, sample {index}: {actual} vs {expected})"
    )]
    TimeBaseMismatch {
        run: usize,
        index: usize,
        expected: f64,
        actual: f64,
    },
}

/// One run's coverage over time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageSeries {
    pub time: Vec<f64>,
    #[serde(alias = "cov_total_ratio_0")]
    pub values: Vec<f64>,
}

impl CoverageSeries {
    #[must_use]
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> Self {
        Self { time, values }
    }

    fn check_lengths(&self, run: usize) -> Result<(), SeriesError> {
        if self.time.len() == self.values.len() {
            Ok(())
        } else {
            Err(SeriesError::LengthMismatch {
                run,
                time_len: self.time.len(),
                value_len: self.values.len(),
            })
        }
    }
}

/// Shared time base and per-timestamp mean coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedSeries {
    pub time: Vec<f64>,
    pub mean: Vec<f64>,
    pub runs: usize,
}

impl AveragedSeries {
    /// Last `(time, mean)` sample, if any.
    #[must_use]
    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.time.last()?, *self.mean.last()?))
    }
}

/// Average runs after checking they share the first run's time base within
/// [`TIME_BASE_TOLERANCE`].
///
/// # Errors
///
/// Returns an error if there are no runs, lengths disagree, or time bases differ.
pub fn average_series(series: &[CoverageSeries]) -> Result<AveragedSeries, SeriesError> {
    average_series_with_tolerance(series, TIME_BASE_TOLERANCE)
}

/// [`average_series`] with an explicit absolute tolerance.
///
/// # Errors
///
/// Returns an error if there are no runs, lengths disagree, or time bases differ.
pub fn average_series_with_tolerance(
    series: &[CoverageSeries],
    tolerance: f64,
) -> Result<AveragedSeries, SeriesError> {
    let (first, rest) = series.split_first().ok_or(SeriesError::NoSeries)?;
    first.check_lengths(0)?;

    let mut sums = first.values.clone();
    for (offset, run) in rest.iter().enumerate() {
        let idx = offset + 1;
        run.check_lengths(idx)?;
        if run.time.len() != first.time.len() {
            return Err(SeriesError::RunLengthMismatch {
                run: idx,
                expected: first.time.len(),
                actual: run.time.len(),
            });
        }
        if let Some((index, (&expected, &actual))) = first
            .time
            .iter()
            .zip(&run.time)
            .enumerate()
            // Negated so a NaN timestamp counts as a mismatch.
            .find(|(_, (expected, actual))| !((*actual - *expected).abs() <= tolerance))
        {
            return Err(SeriesError::TimeBaseMismatch {
                run: idx,
                index,
                expected,
                actual,
            });
        }
        for (sum, value) in sums.iter_mut().zip(&run.values) {
            *sum += value;
        }
    }

    let runs = series.len();
    let denom = count_to_f64(runs);
    Ok(AveragedSeries {
        time: first.time.clone(),
        mean: sums.into_iter().map(|sum| sum / denom).collect(),
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(time: &[f64], values: &[f64]) -> CoverageSeries {
        CoverageSeries::new(time.to_vec(), values.to_vec())
    }

    #[test]
    fn identical_runs_average_to_themselves() {
        let run = series(&[0.0, 0.1, 0.2], &[0.9, 0.5, 0.25]);
        let averaged = average_series(&[run.clone(), run.clone()]).unwrap();
        assert_eq!(averaged.time, run.time);
        for (mean, value) in averaged.mean.iter().zip(&run.values) {
            assert!((mean - value).abs() < 1e-12);
        }
        assert_eq!(averaged.runs, 2);
        assert_eq!(averaged.last(), Some((0.2, 0.25)));
    }

    #[test]
    fn averages_elementwise() {
        let averaged = average_series(&[
            series(&[0.0, 1.0], &[1.0, 0.0]),
            series(&[0.0, 1.0 + 1e-10], &[0.0, 0.5]),
            series(&[0.0, 1.0], &[0.5, 1.0]),
        ])
        .unwrap();
        assert!((averaged.mean[0] - 0.5).abs() < 1e-12);
        assert!((averaged.mean[1] - 0.5).abs() < 1e-12);
        assert_eq!(averaged.time, vec![0.0, 1.0]);
    }

    #[test]
    fn misaligned_time_base_fails_fast() {
        let err = average_series(&[
            series(&[0.0, 1.0, 2.0], &[1.0, 1.0, 1.0]),
            series(&[0.0, 1.0, 2.1], &[1.0, 1.0, 1.0]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            SeriesError::TimeBaseMismatch { run: 1, index: 2, .. }
        ));
        assert!(err.to_string().contains("time vectors differ"));
    }

    #[test]
    fn rejects_empty_and_ragged_input() {
        assert_eq!(average_series(&[]).unwrap_err(), SeriesError::NoSeries);
        assert!(matches!(
            average_series(&[series(&[0.0, 1.0], &[1.0])]),
            Err(SeriesError::LengthMismatch { run: 0, .. })
        ));
        assert!(matches!(
            average_series(&[series(&[0.0, 1.0], &[1.0, 1.0]), series(&[0.0], &[1.0])]),
            Err(SeriesError::RunLengthMismatch { run: 1, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn nan_timestamps_never_match() {
        let err = average_series(&[
            series(&[f64::NAN], &[1.0]),
            series(&[f64::NAN], &[1.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, SeriesError::TimeBaseMismatch { .. }));
    }

    #[test]
    fn deserializes_simulator_field_name() {
        let run: CoverageSeries =
            serde_json::from_str(r#"{"time": [0.0, 0.5], "cov_total_ratio_0": [0.1, 0.2]}"#)
                .unwrap();
        assert_eq!(run.values, vec![0.1, 0.2]);
    }
}
