//! Two-way comparison of strategy variants, one row per iteration.
//!
//! For every iteration the baseline and candidate results are looked up by
//! exact parameter value. When both are present their metrics are compared
//! against an exclusive tolerance; coverage ratios are always computed, with an
//! absent variant contributing zeros so consumers never branch on presence.
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ensure_finite, ensure_tolerance};
use crate::ratio::CoverageRatios;
use crate::record::{AssignmentMatrix, ClusterGroup, Iteration, ResultHierarchy, StrategyResult};
use crate::strategy::StrategyParam;

/// Which two strategy variants to compare and how far apart metrics may drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "ComparisonConfig::default_baseline")]
    pub baseline: StrategyParam,
    #[serde(default = "ComparisonConfig::default_candidate")]
    pub candidate: StrategyParam,
    #[serde(default = "ComparisonConfig::default_tolerance")]
    pub tolerance: f64,
}

impl ComparisonConfig {
    const fn default_baseline() -> StrategyParam {
        StrategyParam::new(0.0)
    }

    const fn default_candidate() -> StrategyParam {
        StrategyParam::new(1.0)
    }

    const fn default_tolerance() -> f64 {
        0.0001
    }

    #[must_use]
    pub const fn new(baseline: StrategyParam, candidate: StrategyParam, tolerance: f64) -> Self {
        Self {
            baseline,
            candidate,
            tolerance,
        }
    }

    /// # Errors
    ///
    /// Returns an error for a non-finite parameter, identical parameters, or a
    /// negative/non-finite tolerance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("baseline", self.baseline)?;
        ensure_finite("candidate", self.candidate)?;
        if self.baseline == self.candidate {
            return Err(ConfigError::IdenticalParameters {
                value: self.baseline,
            });
        }
        ensure_tolerance("tolerance", self.tolerance)
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self::new(
            Self::default_baseline(),
            Self::default_candidate(),
            Self::default_tolerance(),
        )
    }
}

/// Whether two metric values differ by strictly more than `tolerance`.
#[must_use]
pub fn metrics_diverge(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() > tolerance
}

/// Discrepancy flags for one iteration.
///
/// `compared` is false when either variant was missing; both metric flags are
/// then false as well, which is not the same as "no discrepancy".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscrepancyFlags {
    pub compared: bool,
    pub metric_1: bool,
    pub metric_2: bool,
}

impl DiscrepancyFlags {
    fn evaluate(
        baseline: Option<&StrategyResult>,
        candidate: Option<&StrategyResult>,
        tolerance: f64,
    ) -> Self {
        match (baseline, candidate) {
            (Some(a), Some(b)) => Self {
                compared: true,
                metric_1: metrics_diverge(a.metric_1, b.metric_1, tolerance),
                metric_2: metrics_diverge(a.metric_2, b.metric_2, tolerance),
            },
            _ => Self::default(),
        }
    }
}

/// Raw values and coverage of one compared variant; every raw field is absent
/// when the variant is missing from the iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantOutcome {
    pub metric_1: Option<f64>,
    pub metric_2: Option<f64>,
    pub execution_time: Option<f64>,
    pub assignment_matrix: Option<AssignmentMatrix>,
    pub ratios: CoverageRatios,
}

impl VariantOutcome {
    fn from_result(result: Option<&StrategyResult>, capacities: &[f64]) -> Self {
        let matrix = result.map(|r| &r.assignment_matrix);
        Self {
            metric_1: result.map(|r| r.metric_1),
            metric_2: result.map(|r| r.metric_2),
            execution_time: result.map(|r| r.execution_time),
            assignment_matrix: matrix.filter(|m| !m.is_empty()).cloned(),
            ratios: CoverageRatios::compute(matrix, capacities),
        }
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.metric_1.is_some()
    }
}

/// Flat comparison record for one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub iteration: u32,
    pub sensing_range: Vec<f64>,
    pub flags: DiscrepancyFlags,
    pub baseline: VariantOutcome,
    pub candidate: VariantOutcome,
}

/// Compare the configured variants within a single iteration.
#[must_use]
pub fn compare_iteration(
    iteration: &Iteration,
    config: &ComparisonConfig,
    capacities: &[f64],
) -> ComparisonRow {
    let baseline = iteration.result_for(config.baseline);
    let candidate = iteration.result_for(config.candidate);
    if baseline.is_none() || candidate.is_none() {
        log::debug!(
            "iteration {} lacks {}; skipping discrepancy check",
            iteration.number,
            if baseline.is_none() {
                config.baseline
            } else {
                config.candidate
            }
        );
    }

    ComparisonRow {
        iteration: iteration.number,
        sensing_range: iteration.sensing_range.clone(),
        flags: DiscrepancyFlags::evaluate(baseline, candidate, config.tolerance),
        baseline: VariantOutcome::from_result(baseline, capacities),
        candidate: VariantOutcome::from_result(candidate, capacities),
    }
}

/// Comparison rows for one cluster configuration, sorted by iteration number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonGroup {
    pub cluster_key: String,
    pub capacities: Vec<f64>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonGroup {
    fn build(group: &ClusterGroup, config: &ComparisonConfig) -> Self {
        let capacities = group.configuration.capacities();
        let mut rows: Vec<ComparisonRow> = group
            .iterations()
            .map(|iteration| compare_iteration(iteration, config, capacities))
            .collect();
        rows.sort_by_key(|row| row.iteration);
        Self {
            cluster_key: group.configuration.key().to_string(),
            capacities: capacities.to_vec(),
            rows,
        }
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.capacities.len()
    }

    /// Rows whose metric_1 values diverged.
    #[must_use]
    pub fn metric_1_conflicts(&self) -> usize {
        self.rows.iter().filter(|row| row.flags.metric_1).count()
    }

    /// Rows whose metric_2 values diverged.
    #[must_use]
    pub fn metric_2_conflicts(&self) -> usize {
        self.rows.iter().filter(|row| row.flags.metric_2).count()
    }

    /// Rows where at least one variant was missing.
    #[must_use]
    pub fn uncompared(&self) -> usize {
        self.rows.iter().filter(|row| !row.flags.compared).count()
    }
}

/// Comparison output for a whole hierarchy, grouped by cluster configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub config: ComparisonConfig,
    pub groups: Vec<ComparisonGroup>,
}

impl ComparisonReport {
    #[must_use]
    pub fn group(&self, cluster_key: &str) -> Option<&ComparisonGroup> {
        self.groups
            .iter()
            .find(|group| group.cluster_key == cluster_key)
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.groups.iter().map(|group| group.rows.len()).sum()
    }

    /// Widest cluster count across groups.
    #[must_use]
    pub fn max_cluster_count(&self) -> usize {
        self.groups
            .iter()
            .map(ComparisonGroup::cluster_count)
            .max()
            .unwrap_or(0)
    }
}

/// Compare every iteration of every cluster configuration.
#[must_use]
pub fn compare_all(hierarchy: &ResultHierarchy, config: &ComparisonConfig) -> ComparisonReport {
    let groups = hierarchy
        .groups()
        .iter()
        .map(|group| ComparisonGroup::build(group, config))
        .collect();
    ComparisonReport {
        config: *config,
        groups,
    }
}
