//! Text formatting for amounts shown by the command line interface.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// Format `number` as dollars with thousands separators and two decimals,
/// e.g. "-$1,234.50".
pub fn currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();
    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let formatter = |symbol: &str| {
        Formatter::currency(symbol)
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    };

    let formatted = if number < 0.0 {
        NEGATIVE_FMT
            .get_or_init(|| formatter("-$"))
            .as_ref()
            .map(|fmt| fmt.fmt_string(number.abs()))
    } else if number > 0.0 {
        POSITIVE_FMT
            .get_or_init(|| formatter("$"))
            .as_ref()
            .map(|fmt| fmt.fmt_string(number))
    } else {
        // Zero is rendered as "0" by numfmt.
        return "$0.00".to_owned();
    };

    match formatted {
        Some(formatted) => pad_decimals(formatted),
        None if number < 0.0 => format!("-${:.2}", number.abs()),
        None => format!("${number:.2}"),
    }
}

/// numfmt drops trailing zeros, "12.30" comes out as "12.3" and "12.00" as "12".
fn pad_decimals(formatted: String) -> String {
    match formatted.rfind('.') {
        Some(point) => {
            let decimals = formatted.len() - point - 1;
            format!("{formatted}{}", "0".repeat(2usize.saturating_sub(decimals)))
        }
        None => format!("{formatted}.00"),
    }
}
