use anyhow::Result;
use colored::Colorize;
use findrone_core::{OccupancyTensor, StrategyParam};
use serde::Serialize;
use std::io::Write;

use super::{CsvStyle, generated_stamp, write_csv_row, write_json};

#[derive(Serialize)]
struct ParameterSlice {
    parameter: StrategyParam,
    /// `[cluster][agent]`
    counts: Vec<Vec<u32>>,
}

#[derive(Serialize)]
struct OccupancyView {
    clusters: usize,
    agents: usize,
    iterations: usize,
    min: u32,
    max: u32,
    midpoint: f64,
    slices: Vec<ParameterSlice>,
}

impl OccupancyView {
    fn new(tensor: &OccupancyTensor) -> Self {
        let shape = tensor.shape();
        Self {
            clusters: shape.clusters,
            agents: shape.agents,
            iterations: tensor.iterations(),
            min: tensor.min(),
            max: tensor.max(),
            midpoint: tensor.midpoint(),
            slices: tensor
                .parameters()
                .iter()
                .enumerate()
                .map(|(idx, parameter)| ParameterSlice {
                    parameter,
                    counts: tensor.slice(idx).map(<[u32]>::to_vec).collect(),
                })
                .collect(),
        }
    }
}

fn cell_width(tensor: &OccupancyTensor) -> usize {
    tensor.max().to_string().len().max(2)
}

/// Heatmap grids, one per parameter, sharing the tensor's global midpoint.
pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    tensor: &OccupancyTensor,
) -> Result<()> {
    let shape = tensor.shape();
    let midpoint = tensor.midpoint();
    let width = cell_width(tensor);

    writeln!(writer)?;
    writeln!(writer, "{}", "🛰  Cluster Occupancy".bright_cyan().bold())?;
    writeln!(writer, "{}", "=====================".cyan())?;
    writeln!(
        writer,
        "Agents: {}  Clusters: {}  Iterations: {}",
        shape.agents,
        shape.clusters,
        tensor.iterations()
    )?;
    writeln!(
        writer,
        "Range: {}..{} (midpoint {midpoint})",
        tensor.min(),
        tensor.max()
    )?;

    for (idx, parameter) in tensor.parameters().iter().enumerate() {
        writeln!(writer)?;
        writeln!(writer, "{}", format!("Strategy {parameter}").bold())?;
        let header: String = (0..shape.agents)
            .map(|agent| format!(" {:>width$}", agent + 1))
            .collect();
        writeln!(writer, "      {header}")?;
        for (cluster, counts) in tensor.slice(idx).enumerate() {
            write!(writer, "  c{:<3}", cluster + 1)?;
            for &count in counts {
                let cell = format!("{count:>width$}");
                if f64::from(count) > midpoint {
                    write!(writer, " {}", cell.bright_red().bold())?;
                } else {
                    write!(writer, " {}", cell.blue())?;
                }
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    tensor: &OccupancyTensor,
) -> Result<()> {
    write_json(writer, &OccupancyView::new(tensor))
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    tensor: &OccupancyTensor,
) -> Result<()> {
    let shape = tensor.shape();
    writeln!(writer, "# Cluster Occupancy\n")?;
    writeln!(writer, "_Generated {}_\n", generated_stamp())?;
    writeln!(
        writer,
        "- **Iterations**: {}\n- **Range**: {}..{}\n",
        tensor.iterations(),
        tensor.min(),
        tensor.max()
    )?;
    for (idx, parameter) in tensor.parameters().iter().enumerate() {
        writeln!(writer, "## Strategy {parameter}\n")?;
        let header: String = (1..=shape.agents).map(|a| format!(" {a} |")).collect();
        let rule: String = (0..shape.agents).map(|_| "---|").collect();
        writeln!(writer, "| Cluster |{header}")?;
        writeln!(writer, "|---|{rule}")?;
        for (cluster, counts) in tensor.slice(idx).enumerate() {
            let cells: String = counts.iter().map(|c| format!(" {c} |")).collect();
            writeln!(writer, "| {} |{cells}", cluster + 1)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Long form: `parameter,cluster,agent,count`, clusters and agents numbered from 1.
pub fn generate_csv_report<W: Write + ?Sized>(
    writer: &mut W,
    tensor: &OccupancyTensor,
    style: CsvStyle,
) -> Result<()> {
    let header = ["parameter", "cluster", "agent", "count"].map(String::from);
    write_csv_row(writer, &header, style)?;
    for (idx, parameter) in tensor.parameters().iter().enumerate() {
        let label = if style.decimal_comma {
            parameter.to_string().replace('.', ",")
        } else {
            parameter.to_string()
        };
        for (cluster, counts) in tensor.slice(idx).enumerate() {
            for (agent, count) in counts.iter().enumerate() {
                write_csv_row(
                    writer,
                    &[
                        label.clone(),
                        (cluster + 1).to_string(),
                        (agent + 1).to_string(),
                        count.to_string(),
                    ],
                    style,
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use findrone_core::{
        AssignmentMatrix, Iteration, StrategyResult, StrategySet, accumulate_occupancy,
    };

    fn tensor() -> OccupancyTensor {
        let result = |param: f64, rows: Vec<Vec<f64>>| StrategyResult {
            parameter: StrategyParam::new(param),
            metric_1: 1.0,
            metric_2: 1.0,
            assignment_matrix: AssignmentMatrix::from_rows(rows),
            execution_time: 0.0,
        };
        let iterations: Vec<Iteration> = (0..3)
            .map(|number| Iteration {
                number,
                sensing_range: Vec::new(),
                results: vec![
                    result(0.0, vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]]),
                    result(1.0, vec![vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]]),
                ],
            })
            .collect();
        accumulate_occupancy(&iterations, &StrategySet::new([0.0, 1.0]), 50).unwrap()
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn csv_is_long_form() {
        let output = render(|w| generate_csv_report(w, &tensor(), CsvStyle { decimal_comma: false }));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "parameter,cluster,agent,count");
        assert_eq!(lines.len(), 1 + 2 * 2 * 3);
        assert_eq!(lines[1], "0.0,1,1,3");
        assert_eq!(lines[2], "0.0,1,2,0");
        assert!(lines.contains(&"1.0,2,3,3"));
        assert!(!lines.iter().skip(1).any(|line| line.contains(",0,")));
    }

    #[test]
    fn json_nests_counts_by_cluster() {
        let output = render(|w| generate_json_report(w, &tensor()));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["max"], 3);
        assert_eq!(value["slices"][0]["counts"][0], serde_json::json!([3, 0, 3]));
        assert_eq!(value["slices"][1]["parameter"], 1.0);
    }

    #[test]
    fn console_and_markdown_show_every_parameter() {
        let console = render(|w| generate_console_report(w, &tensor()));
        assert!(console.contains("Strategy 0.0"));
        assert!(console.contains("Strategy 1.0"));
        assert!(console.contains("midpoint 1.5"));
        assert!(console.contains("  c1 "));
        assert!(console.contains("  c2 "));
        assert!(!console.contains("  c0 "));

        let markdown = render(|w| generate_markdown_report(w, &tensor()));
        assert!(markdown.contains("## Strategy 1.0"));
        assert!(markdown.contains("| Cluster | 1 | 2 | 3 |"));
        assert!(markdown.contains("| 1 | 3 | 0 | 3 |"));
    }
}
