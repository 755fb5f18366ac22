//! JSON loaders feeding the analysis engine.
use anyhow::{Context, Result};
use findrone_core::{
    AllocationSnapshot, AnalysisConfig, CoverageSeries, RecordError, ResultHierarchy,
    ResultSource, SimulationFile,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Simulator output file holding one coverage run.
pub const SIM_DATA_FILE: &str = "sim_data.json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid results in {}: {source}", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
    #[error("Missing file: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("no {0} configured")]
    NotConfigured(&'static str),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct SimData {
    stored_data: CoverageSeries,
}

/// Results and coverage runs stored as JSON files.
#[derive(Debug, Clone, Default)]
pub struct JsonResultSource {
    results: Option<PathBuf>,
    coverage_root: Option<PathBuf>,
    runs: usize,
}

impl JsonResultSource {
    pub fn new(results: Option<PathBuf>, coverage_root: Option<PathBuf>, runs: usize) -> Self {
        Self {
            results,
            coverage_root,
            runs,
        }
    }

    /// `<root>/<group>/d_<run>/sim_data.json`
    pub fn run_path(root: &Path, group: &str, run: usize) -> PathBuf {
        root.join(group).join(format!("d_{run}")).join(SIM_DATA_FILE)
    }
}

impl ResultSource for JsonResultSource {
    type Error = LoadError;

    fn load_hierarchy(&self) -> Result<ResultHierarchy, Self::Error> {
        let path = self
            .results
            .as_deref()
            .ok_or(LoadError::NotConfigured("results file"))?;
        log::info!("loading simulation results from {}", path.display());
        let file: SimulationFile = read_json(path)?;
        ResultHierarchy::try_from(file).map_err(|source| LoadError::Record {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_coverage_runs(&self, group: &str) -> Result<Vec<CoverageSeries>, Self::Error> {
        let root = self
            .coverage_root
            .as_deref()
            .ok_or(LoadError::NotConfigured("coverage root"))?;
        let group_dir = root.join(group);
        if !group_dir.is_dir() {
            return Err(LoadError::MissingFile(group_dir));
        }
        (0..self.runs)
            .map(|run| {
                let path = Self::run_path(root, group, run);
                if !path.is_file() {
                    return Err(LoadError::MissingFile(path));
                }
                log::info!("loading coverage run {}", path.display());
                read_json::<SimData>(&path).map(|data| data.stored_data)
            })
            .collect()
    }
}

/// Load one allocation snapshot; an unlabeled snapshot takes its parent folder name.
pub fn load_allocation_snapshot(path: &Path) -> Result<AllocationSnapshot, LoadError> {
    log::info!("loading allocation snapshot {}", path.display());
    let mut snapshot: AllocationSnapshot = read_json(path)?;
    if snapshot.label.is_empty() {
        snapshot.label = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(snapshot)
}

pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    AnalysisConfig::from_json(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))
}
