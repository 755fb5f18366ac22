pub mod util;

pub use util::{csv_field, format_decimal, parse_f64_list, split_csv};
