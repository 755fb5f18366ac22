use anyhow::{Context, Result};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a comma-separated list of numbers, e.g. `"0.0, 0.5, 1.0"`.
pub fn parse_f64_list(s: &str) -> Result<Vec<f64>> {
    split_csv(s)
        .iter()
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("invalid number {token:?}"))
        })
        .collect()
}

/// Fixed-precision rendering, optionally with a decimal comma.
pub fn format_decimal(value: f64, precision: usize, decimal_comma: bool) -> String {
    let formatted = format!("{value:.precision$}");
    if decimal_comma {
        formatted.replace('.', ",")
    } else {
        formatted
    }
}

/// Quote a CSV field when it contains the delimiter, a quote, or a line break.
pub fn csv_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn parse_f64_list_reports_bad_tokens() {
        assert_eq!(parse_f64_list("0.0, 0.5,1").unwrap(), vec![0.0, 0.5, 1.0]);
        let err = parse_f64_list("0.0,half").unwrap_err();
        assert!(err.to_string().contains("half"));
    }

    #[test]
    fn format_decimal_supports_comma() {
        assert_eq!(format_decimal(1.2, 4, false), "1.2000");
        assert_eq!(format_decimal(2.0 / 3.0, 4, true), "0,6667");
    }

    #[test]
    fn csv_field_quotes_when_needed() {
        assert_eq!(csv_field("plain", ','), "plain");
        assert_eq!(csv_field("[1, 2]", ','), "\"[1, 2]\"");
        assert_eq!(csv_field("[1, 2]", ';'), "[1, 2]");
        assert_eq!(csv_field("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
    }
}
