//! Findrone Analysis Engine
//!
//! Platform-agnostic aggregation and comparison logic for drone-to-cluster
//! assignment simulation results. This crate performs no I/O: loaders hand it
//! deserialized result hierarchies and it returns in-memory tables and tensors
//! for report writers to render.

pub mod allocation;
pub mod compare;
pub mod config;
pub mod numbers;
pub mod occupancy;
pub mod ratio;
pub mod record;
pub mod strategy;
pub mod timeseries;

// Re-export commonly used types
pub use allocation::{
    AllocationError, AllocationSnapshot, AreaSummary, TaskArea, summarize_allocation,
};
pub use compare::{
    ComparisonConfig, ComparisonGroup, ComparisonReport, ComparisonRow, DiscrepancyFlags,
    VariantOutcome, compare_all, compare_iteration, metrics_diverge,
};
pub use config::{AnalysisConfig, ConfigError};
pub use occupancy::{
    OccupancyAccumulator, OccupancyConfig, OccupancyError, OccupancyShape, OccupancyTensor,
    accumulate_occupancy,
};
pub use ratio::{CoverageRatios, per_cluster_ratios, total_ratio};
pub use record::{
    AssignmentMatrix, ClusterConfiguration, ClusterGroup, Iteration, NumberList, RecordError,
    ResultHierarchy, SensingGroup, SimulationFile, StrategyResult, Trial, TrialSelector,
};
pub use strategy::{StrategyParam, StrategySet};
pub use timeseries::{
    AveragedSeries, CoverageSeries, SeriesError, TIME_BASE_TOLERANCE, average_series,
    average_series_with_tolerance,
};

use anyhow::{Context, anyhow};

/// Trait for abstracting result loading operations
/// Platform-specific implementations should provide this
pub trait ResultSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the full simulation result hierarchy
    ///
    /// # Errors
    ///
    /// Returns an error if the results cannot be loaded or converted.
    fn load_hierarchy(&self) -> Result<ResultHierarchy, Self::Error>;

    /// Load every repeated run recorded for one coverage group
    ///
    /// # Errors
    ///
    /// Returns an error if any run is missing or cannot be parsed.
    fn load_coverage_runs(&self, group: &str) -> Result<Vec<CoverageSeries>, Self::Error>;
}

/// Drives the analysis operations over data from a [`ResultSource`]
pub struct AnalysisEngine<S>
where
    S: ResultSource,
{
    source: S,
    config: AnalysisConfig,
}

impl<S> AnalysisEngine<S>
where
    S: ResultSource,
{
    /// Create an engine after validating `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration violates an invariant.
    pub fn new(source: S, config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { source, config })
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Compare the configured strategy pair across the whole hierarchy
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy cannot be loaded.
    pub fn compare(&self) -> Result<ComparisonReport, S::Error> {
        let hierarchy = self.source.load_hierarchy()?;
        Ok(compare_all(&hierarchy, &self.config.comparison))
    }

    /// Accumulate occupancy counts for one trial: the configured selection, or
    /// trial 0 of the first sensing group of the first cluster group.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails, the selected trial does not exist, or
    /// the assignment matrices cannot be aggregated.
    pub fn occupancy(&self) -> anyhow::Result<OccupancyTensor> {
        let hierarchy = self.source.load_hierarchy()?;
        let occupancy = &self.config.occupancy;
        let selector = match &occupancy.selection {
            Some(selector) => selector.clone(),
            None => hierarchy
                .default_selector()
                .ok_or(OccupancyError::NoAssignments)
                .context("results hold no trial to aggregate")?,
        };
        log::debug!(
            "aggregating occupancy for cluster {} / sensing {} / trial {}",
            selector.cluster_key,
            selector.sensing_key,
            selector.trial
        );
        let trial = hierarchy.trial(&selector).ok_or_else(|| {
            anyhow!(
                "no trial {} under cluster {} / sensing {}",
                selector.trial,
                selector.cluster_key,
                selector.sensing_key
            )
        })?;
        accumulate_occupancy(
            &trial.iterations,
            &occupancy.parameters,
            occupancy.max_iteration,
        )
        .context("occupancy aggregation failed")
    }

    /// Mean coverage over every run of `group`
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the runs do not share a time base.
    pub fn mean_coverage(&self, group: &str) -> anyhow::Result<AveragedSeries> {
        let runs = self.source.load_coverage_runs(group)?;
        average_series_with_tolerance(&runs, self.config.time_base_tolerance)
            .with_context(|| format!("cannot average coverage runs for {group}"))
    }
}
