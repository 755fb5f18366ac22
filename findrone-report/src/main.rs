mod common;
mod loader;
mod reports;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::{parse_f64_list, split_csv};
use findrone_core::{
    AnalysisConfig, AnalysisEngine, AreaSummary, ComparisonReport, OccupancyTensor,
    StrategyParam, StrategySet, TrialSelector, summarize_allocation,
};
use loader::{JsonResultSource, load_allocation_snapshot, load_config};
use reports::CsvStyle;
use reports::coverage::GroupAverage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisMode {
    /// Flag metric discrepancies between two strategies per iteration
    Compare,
    /// Count how often each agent lands in each cluster
    Occupancy,
    /// Average coverage over repeated runs
    Series,
    /// Summarize agent-to-task-area allocation snapshots
    Allocation,
}

#[derive(Debug, Parser)]
#[command(name = "findrone-report", version)]
#[command(about = "Aggregate and compare drone-to-cluster assignment simulation results")]
struct Args {
    /// Analysis to run
    #[arg(long, value_enum, default_value_t = AnalysisMode::Compare)]
    mode: AnalysisMode,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Results file (compare, occupancy) or allocation snapshots (comma-separated)
    #[arg(long, value_delimiter = ',')]
    input: Vec<PathBuf>,

    /// JSON analysis configuration; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Baseline strategy parameter
    #[arg(long, allow_negative_numbers = true)]
    baseline: Option<f64>,

    /// Candidate strategy parameter
    #[arg(long, allow_negative_numbers = true)]
    candidate: Option<f64>,

    /// Metric discrepancy tolerance (exclusive)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Strategy parameters for occupancy (comma-separated)
    #[arg(long)]
    parameters: Option<String>,

    /// Iterations numbered at or above this are excluded from occupancy
    #[arg(long)]
    max_iteration: Option<u32>,

    /// Cluster configuration key of the trial to aggregate
    #[arg(long)]
    cluster_key: Option<String>,

    /// Sensing configuration key of the trial to aggregate
    #[arg(long)]
    sensing_key: Option<String>,

    /// Trial index under the selected sensing configuration
    #[arg(long)]
    trial: Option<usize>,

    /// Directory holding one folder per coverage group
    #[arg(long)]
    coverage_root: Option<PathBuf>,

    /// Coverage groups to average (comma-separated)
    #[arg(long, default_value = "")]
    groups: String,

    /// Runs per coverage group (d_0 .. d_<runs-1>)
    #[arg(long, default_value_t = 10)]
    runs: usize,

    /// Write CSV numbers with a decimal comma and ';' as delimiter
    #[arg(long)]
    decimal_comma: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

enum AnalysisOutput {
    Comparison(ComparisonReport),
    Occupancy(OccupancyTensor),
    Coverage(Vec<GroupAverage>),
    Allocation(Vec<AreaSummary>),
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = build_config(&args)?;
    if args.report == "console" && args.output.is_none() {
        announce_banner();
    }

    let start_time = Instant::now();
    let output = run_analysis(&args, config)?;
    write_reports(&args, &output, start_time)?;
    Ok(())
}

fn announce_banner() {
    println!("{}", "🛸 Findrone Result Analysis".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(baseline) = args.baseline {
        config.comparison.baseline = StrategyParam::new(baseline);
    }
    if let Some(candidate) = args.candidate {
        config.comparison.candidate = StrategyParam::new(candidate);
    }
    if let Some(tolerance) = args.tolerance {
        config.comparison.tolerance = tolerance;
    }
    if let Some(parameters) = &args.parameters {
        config.occupancy.parameters = StrategySet::new(
            parse_f64_list(parameters).context("invalid --parameters")?,
        );
    }
    if let Some(max_iteration) = args.max_iteration {
        config.occupancy.max_iteration = max_iteration;
    }

    match (&args.cluster_key, &args.sensing_key) {
        (Some(cluster_key), Some(sensing_key)) => {
            config.occupancy.selection = Some(TrialSelector {
                cluster_key: cluster_key.clone(),
                sensing_key: sensing_key.clone(),
                trial: args.trial.unwrap_or_default(),
            });
        }
        (None, None) => {
            if let Some(trial) = args.trial {
                let Some(selection) = config.occupancy.selection.as_mut() else {
                    bail!("--trial requires --cluster-key and --sensing-key");
                };
                selection.trial = trial;
            }
        }
        _ => bail!("--cluster-key and --sensing-key must be given together"),
    }

    config.validate().context("invalid analysis configuration")?;
    Ok(config)
}

fn results_path(args: &Args) -> Result<PathBuf> {
    match args.input.as_slice() {
        [path] => Ok(path.clone()),
        [] => bail!("--input <results.json> is required for {:?} mode", args.mode),
        _ => bail!("{:?} mode reads a single results file", args.mode),
    }
}

fn results_engine(args: &Args, config: AnalysisConfig) -> Result<AnalysisEngine<JsonResultSource>> {
    let source = JsonResultSource::new(Some(results_path(args)?), None, 0);
    AnalysisEngine::new(source, config).context("invalid analysis configuration")
}

fn run_analysis(args: &Args, config: AnalysisConfig) -> Result<AnalysisOutput> {
    match args.mode {
        AnalysisMode::Compare => {
            let report = results_engine(args, config)?.compare()?;
            Ok(AnalysisOutput::Comparison(report))
        }
        AnalysisMode::Occupancy => {
            let tensor = results_engine(args, config)?.occupancy()?;
            Ok(AnalysisOutput::Occupancy(tensor))
        }
        AnalysisMode::Series => {
            let Some(root) = args.coverage_root.clone() else {
                bail!("--coverage-root is required for series mode");
            };
            let groups = split_csv(&args.groups);
            if groups.is_empty() {
                bail!("--groups must name at least one coverage group");
            }
            let source = JsonResultSource::new(None, Some(root), args.runs);
            let engine =
                AnalysisEngine::new(source, config).context("invalid analysis configuration")?;
            let averages = groups
                .into_iter()
                .map(|group| {
                    let series = engine.mean_coverage(&group)?;
                    Ok(GroupAverage { group, series })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(AnalysisOutput::Coverage(averages))
        }
        AnalysisMode::Allocation => {
            if args.input.is_empty() {
                bail!("--input must list at least one allocation snapshot");
            }
            let mut summaries = Vec::new();
            for path in &args.input {
                summaries.extend(summarize_snapshot(path)?);
            }
            Ok(AnalysisOutput::Allocation(summaries))
        }
    }
}

fn summarize_snapshot(path: &Path) -> Result<Vec<AreaSummary>> {
    let snapshot = load_allocation_snapshot(path)?;
    summarize_allocation(&snapshot).with_context(|| format!("cannot summarize {}", path.display()))
}

fn write_reports(args: &Args, output: &AnalysisOutput, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let style = CsvStyle {
        decimal_comma: args.decimal_comma,
    };

    match (args.report.as_str(), output) {
        ("json", AnalysisOutput::Comparison(report)) => {
            reports::comparison::generate_json_report(&mut output_target, report)?;
        }
        ("json", AnalysisOutput::Occupancy(tensor)) => {
            reports::occupancy::generate_json_report(&mut output_target, tensor)?;
        }
        ("json", AnalysisOutput::Coverage(averages)) => {
            reports::coverage::generate_json_report(&mut output_target, averages)?;
        }
        ("json", AnalysisOutput::Allocation(summaries)) => {
            reports::allocation::generate_json_report(&mut output_target, summaries)?;
        }
        ("markdown", AnalysisOutput::Comparison(report)) => {
            reports::comparison::generate_markdown_report(&mut output_target, report)?;
        }
        ("markdown", AnalysisOutput::Occupancy(tensor)) => {
            reports::occupancy::generate_markdown_report(&mut output_target, tensor)?;
        }
        ("markdown", AnalysisOutput::Coverage(averages)) => {
            reports::coverage::generate_markdown_report(&mut output_target, averages)?;
        }
        ("markdown", AnalysisOutput::Allocation(summaries)) => {
            reports::allocation::generate_markdown_report(&mut output_target, summaries)?;
        }
        ("csv", AnalysisOutput::Comparison(report)) => {
            reports::comparison::generate_csv_report(&mut output_target, report, style)?;
        }
        ("csv", AnalysisOutput::Occupancy(tensor)) => {
            reports::occupancy::generate_csv_report(&mut output_target, tensor, style)?;
        }
        ("csv", AnalysisOutput::Coverage(averages)) => {
            reports::coverage::generate_csv_report(&mut output_target, averages, style)?;
        }
        ("csv", AnalysisOutput::Allocation(summaries)) => {
            reports::allocation::generate_csv_report(&mut output_target, summaries, style)?;
        }
        (_, AnalysisOutput::Comparison(report)) => {
            reports::comparison::generate_console_report(&mut output_target, report, args.verbose)?;
        }
        (_, AnalysisOutput::Occupancy(tensor)) => {
            reports::occupancy::generate_console_report(&mut output_target, tensor)?;
        }
        (_, AnalysisOutput::Coverage(averages)) => {
            reports::coverage::generate_console_report(&mut output_target, averages)?;
        }
        (_, AnalysisOutput::Allocation(summaries)) => {
            reports::allocation::generate_console_report(&mut output_target, summaries)?;
        }
    }

    if args.report == "console" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use findrone_core::ConfigError;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("findrone-main-{}-{name}", std::process::id()))
    }

    fn base_args() -> Args {
        Args {
            mode: AnalysisMode::Compare,
            report: "json".to_string(),
            input: Vec::new(),
            config: None,
            baseline: None,
            candidate: None,
            tolerance: None,
            parameters: None,
            max_iteration: None,
            cluster_key: None,
            sensing_key: None,
            trial: None,
            coverage_root: None,
            groups: String::new(),
            runs: 10,
            decimal_comma: false,
            output: None,
            verbose: false,
        }
    }

    fn write_results(name: &str) -> PathBuf {
        let path = temp_path(name);
        let result = |alpha: f64, metric_1: f64| {
            json!({
                "alpha": alpha,
                "metric_1": metric_1,
                "metric_2": 0.25,
                "assignment_matrix": [[1.0, 0.0], [0.0, 1.0]],
                "execution_time": 0.1
            })
        };
        let payload = json!({
            "simulations": {
                "[1.0, 1.0]": {
                    "[4, 4]": [{
                        "iterations": [
                            { "iteration": 0, "sensing_range": [4, 4],
                              "results": [result(0.0, 2.0), result(0.5, 2.0), result(1.0, 2.5)] }
                        ]
                    }]
                }
            }
        });
        std::fs::write(&path, payload.to_string()).unwrap();
        path
    }

    #[test]
    fn flags_override_config_file() {
        let config_path = temp_path("config.json");
        std::fs::write(
            &config_path,
            r#"{"comparison": {"tolerance": 0.5}, "occupancy": {"max_iteration": 7}}"#,
        )
        .unwrap();
        let args = Args {
            config: Some(config_path),
            candidate: Some(0.5),
            parameters: Some("0.0, 0.5".to_string()),
            ..base_args()
        };
        let config = build_config(&args).unwrap();
        assert!((config.comparison.tolerance - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.comparison.candidate, StrategyParam::new(0.5));
        assert_eq!(config.occupancy.max_iteration, 7);
        assert_eq!(config.occupancy.parameters, StrategySet::new([0.0, 0.5]));
    }

    #[test]
    fn selector_flags_must_come_together() {
        let args = Args {
            cluster_key: Some("[1.0, 1.0]".to_string()),
            ..base_args()
        };
        assert!(build_config(&args).is_err());

        let args = Args {
            trial: Some(2),
            ..base_args()
        };
        assert!(build_config(&args).is_err());

        let args = Args {
            cluster_key: Some("[1.0, 1.0]".to_string()),
            sensing_key: Some("[4, 4]".to_string()),
            trial: Some(2),
            ..base_args()
        };
        let selection = build_config(&args).unwrap().occupancy.selection.unwrap();
        assert_eq!(selection.trial, 2);
    }

    #[test]
    fn identical_strategies_are_rejected() {
        let args = Args {
            candidate: Some(0.0),
            ..base_args()
        };
        let err = build_config(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::IdenticalParameters { .. })
        ));
    }

    #[test]
    fn compare_mode_requires_single_input() {
        let args = base_args();
        let config = build_config(&args).unwrap();
        assert!(run_analysis(&args, config).is_err());
    }

    #[test]
    fn write_reports_emits_comparison_csv() {
        let input = write_results("compare.json");
        let output = temp_path("compare.csv");
        let args = Args {
            report: "csv".to_string(),
            input: vec![input],
            output: Some(output.clone()),
            ..base_args()
        };
        let config = build_config(&args).unwrap();
        let analysis = run_analysis(&args, config).unwrap();
        write_reports(&args, &analysis, Instant::now()).unwrap();
        let content = std::fs::read_to_string(output).unwrap();
        assert!(content.starts_with("cluster_size,iteration,sensing_range"));
        assert!(content.contains("true,false,true"));
        assert!(!content.contains("Total time"));
    }

    #[test]
    fn write_reports_console_includes_footer() {
        let input = write_results("occupancy.json");
        let output = temp_path("occupancy.txt");
        let args = Args {
            mode: AnalysisMode::Occupancy,
            report: "console".to_string(),
            input: vec![input],
            output: Some(output.clone()),
            ..base_args()
        };
        let config = build_config(&args).unwrap();
        let analysis = run_analysis(&args, config).unwrap();
        write_reports(&args, &analysis, Instant::now()).unwrap();
        let content = std::fs::read_to_string(output).unwrap();
        assert!(content.contains("Cluster Occupancy"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn series_mode_requires_groups() {
        let args = Args {
            mode: AnalysisMode::Series,
            coverage_root: Some(std::env::temp_dir()),
            ..base_args()
        };
        let config = build_config(&args).unwrap();
        let err = run_analysis(&args, config).err().unwrap();
        assert!(err.to_string().contains("--groups"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
