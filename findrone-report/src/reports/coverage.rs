use anyhow::Result;
use colored::Colorize;
use findrone_core::AveragedSeries;
use serde::Serialize;
use std::io::Write;

use super::{CsvStyle, generated_stamp, write_csv_row, write_json};

/// Mean coverage of one group of runs.
#[derive(Debug, Clone, Serialize)]
pub struct GroupAverage {
    pub group: String,
    #[serde(flatten)]
    pub series: AveragedSeries,
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    averages: &[GroupAverage],
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📈 Mean Coverage".bright_cyan().bold())?;
    writeln!(writer, "{}", "================".cyan())?;
    for average in averages {
        let series = &average.series;
        let last = series.last().map_or_else(
            || "n/a".to_string(),
            |(time, mean)| format!("{mean:.4} at t={time}"),
        );
        writeln!(
            writer,
            "{}: {} samples over {} runs, final mean {}",
            average.group.bold(),
            series.time.len(),
            series.runs,
            last
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    averages: &[GroupAverage],
) -> Result<()> {
    write_json(writer, averages)
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    averages: &[GroupAverage],
) -> Result<()> {
    writeln!(writer, "# Mean Coverage\n")?;
    writeln!(writer, "_Generated {}_\n", generated_stamp())?;
    writeln!(writer, "| Group | Runs | Samples | Final time | Final mean |")?;
    writeln!(writer, "|---|---|---|---|---|")?;
    for average in averages {
        let (time, mean) = average
            .series
            .last()
            .map_or((String::new(), String::new()), |(t, m)| {
                (t.to_string(), format!("{m:.4}"))
            });
        writeln!(
            writer,
            "| {} | {} | {} | {time} | {mean} |",
            average.group,
            average.series.runs,
            average.series.time.len()
        )?;
    }
    Ok(())
}

/// `group,time,mean_coverage`, one row per sample.
pub fn generate_csv_report<W: Write + ?Sized>(
    writer: &mut W,
    averages: &[GroupAverage],
    style: CsvStyle,
) -> Result<()> {
    let header = ["group", "time", "mean_coverage"].map(String::from);
    write_csv_row(writer, &header, style)?;
    let number = |value: f64| {
        if style.decimal_comma {
            value.to_string().replace('.', ",")
        } else {
            value.to_string()
        }
    };
    for average in averages {
        for (&time, &mean) in average.series.time.iter().zip(&average.series.mean) {
            write_csv_row(
                writer,
                &[average.group.clone(), number(time), number(mean)],
                style,
            )?;
        }
    }
    Ok(())
}
