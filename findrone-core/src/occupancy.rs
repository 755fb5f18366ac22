//! Occupancy counts: how often each agent held a positive share of each
//! cluster, per strategy parameter.
//!
//! Counts are folded iteration by iteration into an [`OccupancyAccumulator`];
//! partial accumulators over disjoint iteration subsets can be merged by
//! elementwise sum. The finished [`OccupancyTensor`] carries one global
//! minimum and maximum shared by every parameter slice, so heatmaps of
//! different strategies use the same colour scale.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ensure_finite};
use crate::numbers::u32_to_f64;
use crate::record::{AssignmentMatrix, Iteration, TrialSelector};
use crate::strategy::{StrategyParam, StrategySet};

/// Errors raised while accumulating occupancy counts.
#[derive(Debug, Error, PartialEq)]
pub enum OccupancyError {
    #[error("no assignment matrix available to size the occupancy tensor")]
    NoAssignments,
    #[error(
        "iteration {iteration} parameter {parameter}: matrix is {agents}x{clusters}, expected {expected}"
    )]
    ShapeMismatch {
        iteration: u32,
        parameter: StrategyParam,
        agents: usize,
        clusters: usize,
        expected: OccupancyShape,
    },
    #[error("cannot merge accumulators built for different parameters, shapes, or cutoffs")]
    IncompatibleMerge,
}

/// Settings for occupancy aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyConfig {
    #[serde(default = "OccupancyConfig::default_parameters")]
    pub parameters: StrategySet,
    /// Iterations numbered at or beyond this cutoff are excluded.
    #[serde(default = "OccupancyConfig::default_max_iteration")]
    pub max_iteration: u32,
    /// Trial to aggregate; trial 0 of the first sensing group of the first
    /// cluster group when absent.
    #[serde(default)]
    pub selection: Option<TrialSelector>,
}

impl OccupancyConfig {
    fn default_parameters() -> StrategySet {
        StrategySet::new([0.0, 0.5, 1.0])
    }

    const fn default_max_iteration() -> u32 {
        50
    }

    /// # Errors
    ///
    /// Returns an error for an empty set, a duplicate, or a non-finite parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parameters.is_empty() {
            return Err(ConfigError::EmptyParameterSet);
        }
        for param in self.parameters.iter() {
            ensure_finite("parameters", param)?;
        }
        if let Some(value) = self.parameters.first_duplicate() {
            return Err(ConfigError::DuplicateParameter { value });
        }
        Ok(())
    }
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            parameters: Self::default_parameters(),
            max_iteration: Self::default_max_iteration(),
            selection: None,
        }
    }
}

/// Cluster and agent counts of one tensor slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyShape {
    pub clusters: usize,
    pub agents: usize,
}

impl OccupancyShape {
    #[must_use]
    pub fn of(matrix: &AssignmentMatrix) -> Self {
        Self {
            clusters: matrix.cluster_count(),
            agents: matrix.agent_count(),
        }
    }

    /// Shape of the first assignment matrix found in `iterations`.
    pub fn infer<'a, I>(iterations: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Iteration>,
    {
        iterations
            .into_iter()
            .find_map(Iteration::first_matrix)
            .map(Self::of)
    }

    const fn cells(self) -> usize {
        self.clusters * self.agents
    }
}

impl std::fmt::Display for OccupancyShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.agents, self.clusters)
    }
}

/// Running occupancy counts.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyAccumulator {
    parameters: StrategySet,
    shape: OccupancyShape,
    max_iteration: u32,
    counts: Vec<u32>,
    folded: usize,
}

impl OccupancyAccumulator {
    #[must_use]
    pub fn new(parameters: StrategySet, shape: OccupancyShape, max_iteration: u32) -> Self {
        let counts = vec![0; parameters.len() * shape.cells()];
        Self {
            parameters,
            shape,
            max_iteration,
            counts,
            folded: 0,
        }
    }

    /// Add one iteration's positive assignments. Returns whether the iteration
    /// fell inside the cutoff window.
    ///
    /// # Errors
    ///
    /// Returns an error if a counted matrix does not match the tensor shape.
    pub fn fold(&mut self, iteration: &Iteration) -> Result<bool, OccupancyError> {
        if iteration.number >= self.max_iteration {
            log::debug!(
                "iteration {} at or beyond cutoff {}; excluded",
                iteration.number,
                self.max_iteration
            );
            return Ok(false);
        }

        for result in &iteration.results {
            let Some(slice) = self.parameters.index_of(result.parameter) else {
                log::debug!(
                    "iteration {} parameter {} not aggregated",
                    iteration.number,
                    result.parameter
                );
                continue;
            };
            let matrix = &result.assignment_matrix;
            let actual = OccupancyShape::of(matrix);
            if actual != self.shape {
                return Err(OccupancyError::ShapeMismatch {
                    iteration: iteration.number,
                    parameter: result.parameter,
                    agents: actual.agents,
                    clusters: actual.clusters,
                    expected: self.shape,
                });
            }
            let base = slice * self.shape.cells();
            for (cluster, agents) in matrix.transpose().iter().enumerate() {
                for (agent, share) in agents.iter().enumerate() {
                    if *share > 0.0 {
                        self.counts[base + cluster * self.shape.agents + agent] += 1;
                    }
                }
            }
        }

        self.folded += 1;
        Ok(true)
    }

    /// Fold in counts gathered over a disjoint iteration subset.
    ///
    /// # Errors
    ///
    /// Returns an error if the accumulators were set up differently.
    pub fn merge(&mut self, other: &Self) -> Result<(), OccupancyError> {
        if self.parameters != other.parameters
            || self.shape != other.shape
            || self.max_iteration != other.max_iteration
        {
            return Err(OccupancyError::IncompatibleMerge);
        }
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        self.folded += other.folded;
        Ok(())
    }

    #[must_use]
    pub fn finish(self) -> OccupancyTensor {
        let min = self.counts.iter().copied().min().unwrap_or(0);
        let max = self.counts.iter().copied().max().unwrap_or(0);
        OccupancyTensor {
            parameters: self.parameters,
            shape: self.shape,
            counts: self.counts,
            min,
            max,
            iterations: self.folded,
        }
    }
}

/// Finished counts indexed `[parameter][cluster][agent]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyTensor {
    parameters: StrategySet,
    shape: OccupancyShape,
    counts: Vec<u32>,
    min: u32,
    max: u32,
    iterations: usize,
}

impl OccupancyTensor {
    #[must_use]
    pub fn parameters(&self) -> &StrategySet {
        &self.parameters
    }

    #[must_use]
    pub const fn shape(&self) -> OccupancyShape {
        self.shape
    }

    /// Smallest cell across every parameter slice.
    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    /// Largest cell across every parameter slice.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Iterations that contributed counts.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Midpoint of the global range, used to split high and low cells.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (u32_to_f64(self.min) + u32_to_f64(self.max)) / 2.0
    }

    #[must_use]
    pub fn count(&self, parameter: usize, cluster: usize, agent: usize) -> Option<u32> {
        if parameter >= self.parameters.len()
            || cluster >= self.shape.clusters
            || agent >= self.shape.agents
        {
            return None;
        }
        let idx = parameter * self.shape.cells() + cluster * self.shape.agents + agent;
        self.counts.get(idx).copied()
    }

    /// Cluster rows of one parameter slice.
    pub fn slice(&self, parameter: usize) -> impl Iterator<Item = &[u32]> + '_ {
        let cells = self.shape.cells();
        let agents = self.shape.agents.max(1);
        self.counts
            .get(parameter * cells..(parameter + 1) * cells)
            .unwrap_or(&[])
            .chunks(agents)
    }
}

/// Accumulate occupancy over `iterations`, sizing the tensor from the first
/// assignment matrix found.
///
/// # Errors
///
/// Returns an error if no assignment matrix exists or matrices disagree in shape.
pub fn accumulate_occupancy<'a, I>(
    iterations: I,
    parameters: &StrategySet,
    max_iteration: u32,
) -> Result<OccupancyTensor, OccupancyError>
where
    I: IntoIterator<Item = &'a Iteration>,
{
    let iterations: Vec<&Iteration> = iterations.into_iter().collect();
    let shape =
        OccupancyShape::infer(iterations.iter().copied()).ok_or(OccupancyError::NoAssignments)?;
    let mut accumulator = OccupancyAccumulator::new(parameters.clone(), shape, max_iteration);
    for iteration in iterations {
        accumulator.fold(iteration)?;
    }
    Ok(accumulator.finish())
}
