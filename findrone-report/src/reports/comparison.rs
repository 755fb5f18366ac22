use anyhow::Result;
use colored::Colorize;
use findrone_core::{ComparisonReport, ComparisonRow, NumberList, VariantOutcome};
use std::io::Write;

use super::{CsvStyle, generated_stamp, write_csv_row, write_json};
use crate::common::format_decimal;

const METRIC_2_PRECISION: usize = 10;
const RATIO_PRECISION: usize = 4;

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn optional_metric_2(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.METRIC_2_PRECISION$}"))
        .unwrap_or_default()
}

fn row_status(row: &ComparisonRow) -> String {
    if !row.flags.compared {
        "⏭  not compared".dimmed().to_string()
    } else if row.flags.metric_1 || row.flags.metric_2 {
        let mut which = Vec::new();
        if row.flags.metric_1 {
            which.push("metric_1");
        }
        if row.flags.metric_2 {
            which.push("metric_2");
        }
        format!("⚠️  {}", which.join(" + ")).yellow().to_string()
    } else {
        "✅ match".green().to_string()
    }
}

fn write_variant<W: Write + ?Sized>(
    writer: &mut W,
    label: &str,
    outcome: &VariantOutcome,
    verbose: bool,
) -> Result<()> {
    if !outcome.is_present() {
        writeln!(writer, "     {label}: missing")?;
        return Ok(());
    }
    writeln!(
        writer,
        "     {label}: metric_1 {}, metric_2 {}, total ratio {:.RATIO_PRECISION$}, time {}s",
        optional(outcome.metric_1),
        optional_metric_2(outcome.metric_2),
        outcome.ratios.total,
        optional(outcome.execution_time),
    )?;
    if verbose {
        if let Some(matrix) = &outcome.assignment_matrix {
            writeln!(writer, "       matrix: {matrix}")?;
        }
        writeln!(
            writer,
            "       per-cluster: {}",
            NumberList(&outcome.ratios.per_cluster)
        )?;
    }
    Ok(())
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    report: &ComparisonReport,
    verbose: bool,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Strategy Comparison".bright_cyan().bold())?;
    writeln!(writer, "{}", "======================".cyan())?;
    writeln!(
        writer,
        "Baseline {} vs candidate {} (tolerance {})",
        report.config.baseline, report.config.candidate, report.config.tolerance
    )?;

    for group in &report.groups {
        writeln!(writer)?;
        writeln!(writer, "Cluster Size: {}", group.cluster_key.bold())?;
        writeln!(writer, "Total iterations: {}", group.rows.len())?;
        for row in &group.rows {
            writeln!(
                writer,
                "  Iteration {} (sensing {}): {}",
                row.iteration,
                NumberList(&row.sensing_range),
                row_status(row)
            )?;
            write_variant(writer, "baseline ", &row.baseline, verbose)?;
            write_variant(writer, "candidate", &row.candidate, verbose)?;
        }
        writeln!(
            writer,
            "Number of Metric_1 conflicts: {}",
            group.metric_1_conflicts()
        )?;
        writeln!(
            writer,
            "Number of Metric_2 conflicts: {}",
            group.metric_2_conflicts()
        )?;
        if group.uncompared() > 0 {
            writeln!(
                writer,
                "{}",
                format!("Iterations not compared: {}", group.uncompared()).yellow()
            )?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    report: &ComparisonReport,
) -> Result<()> {
    write_json(writer, report)
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    report: &ComparisonReport,
) -> Result<()> {
    writeln!(writer, "# Strategy Comparison Results\n")?;
    writeln!(writer, "_Generated {}_\n", generated_stamp())?;
    writeln!(
        writer,
        "- **Baseline**: {}\n- **Candidate**: {}\n- **Tolerance**: {}\n",
        report.config.baseline, report.config.candidate, report.config.tolerance
    )?;

    for group in &report.groups {
        writeln!(writer, "## Cluster Size {}\n", group.cluster_key)?;
        writeln!(writer, "- **Total iterations**: {}", group.rows.len())?;
        writeln!(
            writer,
            "- **Metric_1 conflicts**: {}",
            group.metric_1_conflicts()
        )?;
        writeln!(
            writer,
            "- **Metric_2 conflicts**: {}",
            group.metric_2_conflicts()
        )?;
        writeln!(writer, "- **Not compared**: {}\n", group.uncompared())?;
        writeln!(
            writer,
            "| Iteration | Sensing range | Compared | Metric_1 | Metric_2 | Baseline ratio | Candidate ratio |"
        )?;
        writeln!(writer, "|---|---|---|---|---|---|---|")?;
        for row in &group.rows {
            let mark = |flag: bool| if flag { "⚠️" } else { "" };
            writeln!(
                writer,
                "| {} | {} | {} | {} | {} | {:.RATIO_PRECISION$} | {:.RATIO_PRECISION$} |",
                row.iteration,
                NumberList(&row.sensing_range),
                if row.flags.compared { "yes" } else { "no" },
                mark(row.flags.metric_1),
                mark(row.flags.metric_2),
                row.baseline.ratios.total,
                row.candidate.ratios.total,
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn variant_headers(prefix: &str, clusters: usize) -> Vec<String> {
    let mut headers: Vec<String> = [
        "metric_1",
        "metric_2",
        "execution_time",
        "assignment_matrix",
        "total_ratio",
    ]
    .iter()
    .map(|name| format!("{prefix}_{name}"))
    .collect();
    headers.extend((1..=clusters).map(|c| format!("{prefix}_ratio_cluster_{c}")));
    headers
}

fn variant_cells(outcome: &VariantOutcome, clusters: usize, style: CsvStyle) -> Vec<String> {
    let ratio = |value: f64| format_decimal(value, RATIO_PRECISION, style.decimal_comma);
    let mut cells = vec![
        optional(outcome.metric_1),
        optional_metric_2(outcome.metric_2),
        optional(outcome.execution_time),
        outcome
            .assignment_matrix
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        ratio(outcome.ratios.total),
    ];
    cells.extend((0..clusters).map(|c| {
        outcome
            .ratios
            .per_cluster
            .get(c)
            .map(|&value| ratio(value))
            .unwrap_or_default()
    }));
    cells
}

/// One row per (cluster size, iteration); per-cluster ratio columns are
/// numbered from 1 and padded to the widest configuration in the report.
pub fn generate_csv_report<W: Write + ?Sized>(
    writer: &mut W,
    report: &ComparisonReport,
    style: CsvStyle,
) -> Result<()> {
    let clusters = report.max_cluster_count();
    let mut header: Vec<String> = [
        "cluster_size",
        "iteration",
        "sensing_range",
        "flag_1_metric_1",
        "flag_2_metric_2",
        "compared",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    header.extend(variant_headers("baseline", clusters));
    header.extend(variant_headers("candidate", clusters));
    write_csv_row(writer, &header, style)?;

    for group in &report.groups {
        for row in &group.rows {
            let mut cells = vec![
                group.cluster_key.clone(),
                row.iteration.to_string(),
                NumberList(&row.sensing_range).to_string(),
                row.flags.metric_1.to_string(),
                row.flags.metric_2.to_string(),
                row.flags.compared.to_string(),
            ];
            cells.extend(variant_cells(&row.baseline, clusters, style));
            cells.extend(variant_cells(&row.candidate, clusters, style));
            write_csv_row(writer, &cells, style)?;
        }
    }
    Ok(())
}
