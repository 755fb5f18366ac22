use anyhow::Result;
use colored::Colorize;
use findrone_core::AreaSummary;
use std::io::Write;

use super::{CsvStyle, generated_stamp, write_csv_row, write_json};
use crate::common::format_decimal;

fn agents_label(agents: &[usize]) -> String {
    agents
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    summaries: &[AreaSummary],
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "🗺  Task Area Allocation".bright_cyan().bold())?;
    writeln!(writer, "{}", "========================".cyan())?;
    for row in summaries {
        let density = row
            .density
            .map_or_else(|| "n/a".to_string(), |d| format!("{d:.4}"));
        let ratio = row
            .sensing_to_task_area_ratio
            .map_or_else(|| "n/a".yellow().to_string(), |r| format!("{r:.4}"));
        writeln!(
            writer,
            "{} area {}: {} broken over {} (density {density}), sensing {} (ratio {ratio}), agents [{}]",
            row.label.bold(),
            row.area_id,
            row.broken_sensor_count,
            row.area_size,
            row.sensing_area_sum,
            agents_label(&row.allocated_agents)
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    summaries: &[AreaSummary],
) -> Result<()> {
    write_json(writer, summaries)
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    summaries: &[AreaSummary],
) -> Result<()> {
    writeln!(writer, "# Task Area Allocation\n")?;
    writeln!(writer, "_Generated {}_\n", generated_stamp())?;
    writeln!(
        writer,
        "| Snapshot | Area | Broken sensors | Area size | Density | Sensing sum | Ratio |"
    )?;
    writeln!(writer, "|---|---|---|---|---|---|---|")?;
    for row in summaries {
        let fmt = |value: Option<f64>| value.map(|v| format!("{v:.4}")).unwrap_or_default();
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {} | {} |",
            row.label,
            row.area_id,
            row.broken_sensor_count,
            row.area_size,
            fmt(row.density),
            row.sensing_area_sum,
            fmt(row.sensing_to_task_area_ratio)
        )?;
    }
    Ok(())
}

/// One row per (snapshot, area); undefined density and ratio are empty cells.
pub fn generate_csv_report<W: Write + ?Sized>(
    writer: &mut W,
    summaries: &[AreaSummary],
    style: CsvStyle,
) -> Result<()> {
    let header = [
        "label",
        "area_id",
        "broken_sensor_count",
        "area_size",
        "density",
        "sensing_area_sum",
        "sensing_to_task_area_ratio",
        "allocated_agents",
    ]
    .map(String::from);
    write_csv_row(writer, &header, style)?;
    let number = |value: f64| format_decimal(value, 4, style.decimal_comma);
    for row in summaries {
        write_csv_row(
            writer,
            &[
                row.label.clone(),
                row.area_id.to_string(),
                row.broken_sensor_count.to_string(),
                number(row.area_size),
                row.density.map(number).unwrap_or_default(),
                number(row.sensing_area_sum),
                row.sensing_to_task_area_ratio
                    .map(number)
                    .unwrap_or_default(),
                agents_label(&row.allocated_agents),
            ],
            style,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summaries() -> Vec<AreaSummary> {
        vec![
            AreaSummary {
                label: "d_0".to_string(),
                area_id: 1,
                broken_sensor_count: 6,
                area_size: 12.0,
                density: Some(0.5),
                sensing_area_sum: 50.0,
                sensing_to_task_area_ratio: Some(50.0 / 12.0),
                allocated_agents: vec![1, 2],
            },
            AreaSummary {
                label: "d_0".to_string(),
                area_id: 2,
                broken_sensor_count: 4,
                area_size: 0.0,
                density: None,
                sensing_area_sum: 10.0,
                sensing_to_task_area_ratio: None,
                allocated_agents: vec![0],
            },
        ]
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
    fn csv_leaves_undefined_ratios_empty() {
        let output = render(|w| generate_csv_report(w, &summaries(), CsvStyle { decimal_comma: false }));
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with("label,area_id,broken_sensor_count"));
        assert_eq!(lines[1], "d_0,1,6,12.0000,0.5000,50.0000,4.1667,1 2");
        assert_eq!(lines[2], "d_0,2,4,0.0000,,10.0000,,0");
    }

    #[test]
    fn other_formats_list_every_area() {
        let console = render(|w| generate_console_report(w, &summaries()));
        assert!(console.contains("density n/a"));
        let markdown = render(|w| generate_markdown_report(w, &summaries()));
        assert!(markdown.contains("| d_0 | 1 | 6 | 12 | 0.5000 | 50 | 4.1667 |"));
        let json = render(|w| generate_json_report(w, &summaries()));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value[1]["density"].is_null());
    }
}
