//! Typed model of one simulation result hierarchy.
//!
//! The serialized layout nests `cluster configuration -> sensing configuration
//! -> trial -> iteration -> strategy result`. [`SimulationFile`] mirrors that
//! layout one-to-one; [`ResultHierarchy`] is the typed form the analysis code
//! consumes, with every cluster-configuration key parsed into its capacity
//! vector exactly once.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::strategy::StrategyParam;

/// Errors raised while converting serialized results into the typed hierarchy.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to decode simulation results: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cluster configuration key {key:?} lists no capacities")]
    EmptyClusterKey { key: String },
    #[error("cluster configuration key {key:?} has unparsable capacity {token:?}")]
    InvalidCapacity { key: String, token: String },
    #[error("cluster configuration key {key:?} has invalid capacity {value}")]
    NegativeCapacity { key: String, value: f64 },
}

/// Agent-by-cluster allocation shares, stored agent-major (row = agent).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentMatrix {
    rows: Vec<Vec<f64>>,
}

impl AssignmentMatrix {
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest agent row.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Share of `agent` in `cluster`; cells missing from a ragged row read as 0.0.
    #[must_use]
    pub fn cell(&self, agent: usize, cluster: usize) -> f64 {
        self.rows
            .get(agent)
            .and_then(|row| row.get(cluster))
            .copied()
            .unwrap_or(0.0)
    }

    /// Every entry, row by row.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    /// Entries of one cluster column across all agents.
    pub fn column(&self, cluster: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(cluster).copied().unwrap_or(0.0))
    }

    /// Cluster-major copy (row = cluster, column = agent).
    #[must_use]
    pub fn transpose(&self) -> Vec<Vec<f64>> {
        (0..self.cluster_count())
            .map(|cluster| self.column(cluster).collect())
            .collect()
    }
}

impl fmt::Display for AssignmentMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, row) in self.rows.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", NumberList(row))?;
        }
        write!(f, "]")
    }
}

/// List-style rendering of a numeric slice, e.g. `[8, 7, 9.5]`.
pub struct NumberList<'a>(pub &'a [f64]);

impl fmt::Display for NumberList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}

/// Outcome of one strategy variant within an iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    #[serde(rename = "alpha", alias = "beta", alias = "parameter")]
    pub parameter: StrategyParam,
    pub metric_1: f64,
    pub metric_2: f64,
    #[serde(default)]
    pub assignment_matrix: AssignmentMatrix,
    #[serde(default)]
    pub execution_time: f64,
}

/// One simulation iteration and every strategy evaluated in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    #[serde(rename = "iteration")]
    pub number: u32,
    #[serde(default)]
    pub sensing_range: Vec<f64>,
    #[serde(default)]
    pub results: Vec<StrategyResult>,
}

impl Iteration {
    /// The result whose strategy parameter equals `param` exactly.
    #[must_use]
    pub fn result_for(&self, param: StrategyParam) -> Option<&StrategyResult> {
        self.results.iter().find(|result| result.parameter == param)
    }

    /// First non-empty assignment matrix, used to infer agent/cluster counts.
    #[must_use]
    pub fn first_matrix(&self) -> Option<&AssignmentMatrix> {
        self.results
            .iter()
            .map(|result| &result.assignment_matrix)
            .find(|matrix| !matrix.is_empty())
    }
}

/// One trial: an ordered run of iterations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trial {
    #[serde(default)]
    pub iterations: Vec<Iteration>,
}

/// Serialized layout of a results file. Maps keep the producer's key order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationFile {
    #[serde(default)]
    pub simulations: IndexMap<String, IndexMap<String, Vec<Trial>>>,
}

fn check_capacity(key: &str, value: f64) -> Result<(), RecordError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RecordError::NegativeCapacity {
            key: key.to_string(),
            value,
        })
    }
}

/// Ordered cluster capacities, identified by the key string they were parsed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterConfiguration {
    key: String,
    capacities: Vec<f64>,
}

impl ClusterConfiguration {
    /// Parse a list-style key such as `"[117.5, 87.5, 119.0]"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key lists no capacities, or a capacity is not a
    /// finite, non-negative number.
    pub fn parse(key: &str) -> Result<Self, RecordError> {
        let inner = key
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim();
        if inner.is_empty() {
            return Err(RecordError::EmptyClusterKey {
                key: key.to_string(),
            });
        }

        let mut capacities = Vec::new();
        for token in inner.split(',') {
            let token = token.trim();
            let value: f64 = token.parse().map_err(|_| RecordError::InvalidCapacity {
                key: key.to_string(),
                token: token.to_string(),
            })?;
            check_capacity(key, value)?;
            capacities.push(value);
        }

        Ok(Self {
            key: key.to_string(),
            capacities,
        })
    }

    /// Build a configuration from capacities, rendering the key list-style.
    ///
    /// # Errors
    ///
    /// Returns an error under the same rules as [`ClusterConfiguration::parse`].
    pub fn from_capacities(capacities: Vec<f64>) -> Result<Self, RecordError> {
        let key = NumberList(&capacities).to_string();
        if capacities.is_empty() {
            return Err(RecordError::EmptyClusterKey { key });
        }
        for &value in &capacities {
            check_capacity(&key, value)?;
        }
        Ok(Self { key, capacities })
    }

    /// The key exactly as it appeared in the source data.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn capacities(&self) -> &[f64] {
        &self.capacities
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.capacities.len()
    }
}

/// Trials sharing one sensing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SensingGroup {
    pub key: String,
    pub trials: Vec<Trial>,
}

/// Everything recorded under one cluster configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterGroup {
    pub configuration: ClusterConfiguration,
    pub sensing: Vec<SensingGroup>,
}

impl ClusterGroup {
    /// Every iteration in traversal order: sensing group, trial, iteration.
    pub fn iterations(&self) -> impl Iterator<Item = &Iteration> + '_ {
        self.sensing
            .iter()
            .flat_map(|group| group.trials.iter())
            .flat_map(|trial| trial.iterations.iter())
    }
}

/// Addresses a single trial inside a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSelector {
    pub cluster_key: String,
    pub sensing_key: String,
    #[serde(default)]
    pub trial: usize,
}

/// Typed simulation result hierarchy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultHierarchy {
    groups: Vec<ClusterGroup>,
}

impl ResultHierarchy {
    #[must_use]
    pub fn new(groups: Vec<ClusterGroup>) -> Self {
        Self { groups }
    }

    /// Decode a results file and convert it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a cluster key cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let file: SimulationFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }

    #[must_use]
    pub fn groups(&self) -> &[ClusterGroup] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, cluster_key: &str) -> Option<&ClusterGroup> {
        self.groups
            .iter()
            .find(|group| group.configuration.key() == cluster_key)
    }

    #[must_use]
    pub fn trial(&self, selector: &TrialSelector) -> Option<&Trial> {
        self.group(&selector.cluster_key)?
            .sensing
            .iter()
            .find(|group| group.key == selector.sensing_key)?
            .trials
            .get(selector.trial)
    }

    /// Trial 0 of the first sensing group of the first cluster group.
    #[must_use]
    pub fn default_selector(&self) -> Option<TrialSelector> {
        let group = self.groups.first()?;
        let sensing = group.sensing.first()?;
        Some(TrialSelector {
            cluster_key: group.configuration.key().to_string(),
            sensing_key: sensing.key.clone(),
            trial: 0,
        })
    }
}

impl TryFrom<SimulationFile> for ResultHierarchy {
    type Error = RecordError;

    fn try_from(file: SimulationFile) -> Result<Self, Self::Error> {
        let groups = file
            .simulations
            .into_iter()
            .map(|(key, sensing)| {
                let configuration = ClusterConfiguration::parse(&key)?;
                let sensing = sensing
                    .into_iter()
                    .map(|(key, trials)| SensingGroup { key, trials })
                    .collect();
                Ok(ClusterGroup {
                    configuration,
                    sensing,
                })
            })
            .collect::<Result<Vec<_>, RecordError>>()?;
        Ok(Self { groups })
    }
}
