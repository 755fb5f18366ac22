//! Coverage ratios of an assignment matrix against cluster capacities.
use serde::{Deserialize, Serialize};

use crate::numbers::{ratio_or_zero, sum_nonzero};
use crate::record::AssignmentMatrix;

/// Per-cluster ratios: the non-zero entries of each cluster column divided by
/// that cluster's capacity.
///
/// A zero capacity yields 0.0 for its cluster. An absent or empty matrix, or
/// empty capacities, yields one 0.0 per capacity.
#[must_use]
pub fn per_cluster_ratios(matrix: Option<&AssignmentMatrix>, capacities: &[f64]) -> Vec<f64> {
    let Some(matrix) = matrix.filter(|m| !m.is_empty()) else {
        return vec![0.0; capacities.len()];
    };
    capacities
        .iter()
        .enumerate()
        .map(|(cluster, &capacity)| ratio_or_zero(sum_nonzero(matrix.column(cluster)), capacity))
        .collect()
}

/// Sum of every non-zero matrix entry divided by the total capacity.
#[must_use]
pub fn total_ratio(matrix: Option<&AssignmentMatrix>, capacities: &[f64]) -> f64 {
    let Some(matrix) = matrix.filter(|m| !m.is_empty()) else {
        return 0.0;
    };
    if capacities.is_empty() {
        return 0.0;
    }
    ratio_or_zero(sum_nonzero(matrix.values()), capacities.iter().sum())
}

/// Total and per-cluster coverage for one strategy variant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageRatios {
    pub total: f64,
    pub per_cluster: Vec<f64>,
}

impl CoverageRatios {
    #[must_use]
    pub fn compute(matrix: Option<&AssignmentMatrix>, capacities: &[f64]) -> Self {
        Self {
            total: total_ratio(matrix, capacities),
            per_cluster: per_cluster_ratios(matrix, capacities),
        }
    }

    /// Ratios for an absent variant: all zero, one entry per cluster.
    #[must_use]
    pub fn zeroed(clusters: usize) -> Self {
        Self {
            total: 0.0,
            per_cluster: vec![0.0; clusters],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> AssignmentMatrix {
        AssignmentMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 0.0]])
    }

    #[test]
    fn worked_example_matches_hand_computation() {
        let matrix = sample_matrix();
        let ratios = per_cluster_ratios(Some(&matrix), &[2.0, 3.0]);
        assert!((ratios[0] - 2.0).abs() < 1e-12);
        assert!((ratios[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((total_ratio(Some(&matrix), &[2.0, 3.0]) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn zero_capacity_cluster_reads_zero() {
        let matrix = sample_matrix();
        let ratios = per_cluster_ratios(Some(&matrix), &[0.0, 3.0]);
        assert!(ratios[0].abs() < f64::EPSILON);
        assert!((ratios[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!(total_ratio(Some(&matrix), &[0.0, 0.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn all_zero_matrix_yields_zero_ratios() {
        let matrix = AssignmentMatrix::from_rows(vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
        let capacities = [4.0, 5.0];
        assert!(total_ratio(Some(&matrix), &capacities).abs() < f64::EPSILON);
        assert!(
            per_cluster_ratios(Some(&matrix), &capacities)
                .iter()
                .all(|ratio| ratio.abs() < f64::EPSILON)
        );
    }

    #[test]
    fn absent_inputs_degrade_to_zeros() {
        assert_eq!(per_cluster_ratios(None, &[1.0, 2.0, 3.0]), vec![0.0; 3]);
        let empty = AssignmentMatrix::default();
        assert_eq!(per_cluster_ratios(Some(&empty), &[1.0]), vec![0.0]);
        assert!(total_ratio(None, &[1.0]).abs() < f64::EPSILON);
        assert!(total_ratio(Some(&sample_matrix()), &[]).abs() < f64::EPSILON);
        assert!(per_cluster_ratios(Some(&sample_matrix()), &[]).is_empty());
    }

    #[test]
    fn compute_bundles_total_and_clusters() {
        let ratios = CoverageRatios::compute(Some(&sample_matrix()), &[2.0, 3.0]);
        assert_eq!(ratios.per_cluster.len(), 2);
        assert!((ratios.total - 1.2).abs() < 1e-12);
        assert_eq!(CoverageRatios::zeroed(2).per_cluster, vec![0.0, 0.0]);
    }
}
