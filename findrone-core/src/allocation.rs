//! Per-area summary of an agent-to-task-area allocation snapshot.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::numbers::{count_to_f64, ratio_or_none};

/// Errors raised while summarizing an allocation snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("{label}: area {area_id} allocates agent {agent}, but only {agents} sensing areas exist")]
    UnknownAgent {
        label: String,
        area_id: u32,
        agent: usize,
        agents: usize,
    },
}

/// One task area in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskArea {
    pub broken_sensor_count: usize,
    pub area_size: f64,
    #[serde(default)]
    pub allocated_agents: Vec<usize>,
}

/// Allocation produced for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSnapshot {
    #[serde(default)]
    pub label: String,
    /// Sensing area of every agent, indexed by agent.
    pub sensing_areas: Vec<f64>,
    #[serde(default)]
    pub areas: BTreeMap<u32, TaskArea>,
}

/// Derived figures for one task area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub label: String,
    pub area_id: u32,
    pub broken_sensor_count: usize,
    pub area_size: f64,
    /// Broken sensors per unit area; absent for a zero-sized area.
    pub density: Option<f64>,
    pub sensing_area_sum: f64,
    /// Allocated sensing area over task area; absent for a zero-sized area.
    pub sensing_to_task_area_ratio: Option<f64>,
    pub allocated_agents: Vec<usize>,
}

/// Summarize every area of `snapshot` in ascending area id order.
///
/// # Errors
///
/// Returns an error if an area allocates an agent with no sensing area.
pub fn summarize_allocation(
    snapshot: &AllocationSnapshot,
) -> Result<Vec<AreaSummary>, AllocationError> {
    snapshot
        .areas
        .iter()
        .map(|(&area_id, area)| {
            let mut sensing_area_sum = 0.0;
            for &agent in &area.allocated_agents {
                let sensing = snapshot.sensing_areas.get(agent).ok_or_else(|| {
                    AllocationError::UnknownAgent {
                        label: snapshot.label.clone(),
                        area_id,
                        agent,
                        agents: snapshot.sensing_areas.len(),
                    }
                })?;
                sensing_area_sum += sensing;
            }
            Ok(AreaSummary {
                label: snapshot.label.clone(),
                area_id,
                broken_sensor_count: area.broken_sensor_count,
                area_size: area.area_size,
                density: ratio_or_none(count_to_f64(area.broken_sensor_count), area.area_size),
                sensing_area_sum,
                sensing_to_task_area_ratio: ratio_or_none(sensing_area_sum, area.area_size),
                allocated_agents: area.allocated_agents.clone(),
            })
        })
        .collect()
}
