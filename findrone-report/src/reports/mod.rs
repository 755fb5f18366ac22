pub mod allocation;
pub mod comparison;
pub mod coverage;
pub mod occupancy;

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Options shared by the CSV renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvStyle {
    pub decimal_comma: bool,
}

impl CsvStyle {
    pub const fn delimiter(self) -> char {
        if self.decimal_comma { ';' } else { ',' }
    }
}

pub(crate) fn write_json<W: Write + ?Sized, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub(crate) fn write_csv_row<W: Write + ?Sized>(
    writer: &mut W,
    cells: &[String],
    style: CsvStyle,
) -> Result<()> {
    let delimiter = style.delimiter();
    let line = cells
        .iter()
        .map(|cell| crate::common::csv_field(cell, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string());
    writeln!(writer, "{line}")?;
    Ok(())
}

pub(crate) fn generated_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_comma_switches_delimiter() {
        assert_eq!(CsvStyle { decimal_comma: false }.delimiter(), ',');
        assert_eq!(CsvStyle { decimal_comma: true }.delimiter(), ';');
    }

    #[test]
    fn csv_row_quotes_cells_containing_delimiter() {
        let mut buffer = Vec::new();
        let cells = vec!["[1, 2]".to_string(), "0,5".to_string()];
        write_csv_row(&mut buffer, &cells, CsvStyle { decimal_comma: false }).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "\"[1, 2]\",\"0,5\"\n");

        let mut buffer = Vec::new();
        write_csv_row(&mut buffer, &cells, CsvStyle { decimal_comma: true }).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "[1, 2];0,5\n");
    }
}
