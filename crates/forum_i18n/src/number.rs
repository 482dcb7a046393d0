//! Number, percentage, currency and storage-size formatting.
//!
//! Option precedence is always: caller options, then the locale's settings
//! from the tree (`number.format` and friends), then fixed defaults.

use tracing::warn;

use crate::options::{ArgValue, Options};
use crate::resolver::Resolver;

const STORAGE_UNITS: [&str; 5] = ["byte", "kb", "mb", "gb", "tb"];
const KIB: f64 = 1024.0;

fn number_defaults() -> Options {
    Options::new()
        .with("precision", 3)
        .with("separator", ".")
        .with("delimiter", ",")
        .with("strip_insignificant_zeros", false)
}

/// Enough fractional digits to print any finite `f64` exactly.
const EXACT_DIGITS: usize = 1100;

/// Fixed-point text of a non-negative `value`, with exact ties rounded up.
///
/// Ties are decided on the exact binary value, so `0.15` (really
/// `0.1499…`) rounds to `0.1` while `1.25` rounds to `1.3`.
fn to_fixed(value: f64, precision: usize) -> String {
    let exact = format!("{value:.EXACT_DIGITS$}");
    let Some((int_part, frac)) = exact.split_once('.') else {
        return format!("{:.*}", precision, value);
    };
    let tail = &frac[precision.min(frac.len())..];
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return format!("{:.*}", precision, value);
    }

    let mut digits: Vec<u8> = int_part.bytes().chain(frac[..precision].bytes()).collect();
    let mut carry = true;
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            carry = false;
            break;
        }
    }
    if carry {
        digits.insert(0, b'1');
    }

    let split = digits.len() - precision;
    let mut out = String::from_utf8_lossy(&digits[..split]).into_owned();
    if precision > 0 {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(&digits[split..]));
    }
    out
}

/// Group `digits` in threes from the right.
fn group_thousands(digits: &str, delimiter: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * delimiter.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(delimiter);
        }
        out.push(c);
    }
    out
}

/// Format `number` with already-merged options.
///
/// Reads `precision`, `separator`, `delimiter` and
/// `strip_insignificant_zeros`; missing settings use the fixed defaults.
/// Stripping only removes fractional zeros: at precision 0, `100` stays `100`.
pub fn format_number(number: f64, options: &Options) -> String {
    let defaults = number_defaults();
    let options = Options::merge([options, &defaults]);
    let precision = options.precision().unwrap_or(3);
    let separator = options.str_value("separator").unwrap_or(".");
    let delimiter = options.str_value("delimiter").unwrap_or(",");

    if !number.is_finite() {
        warn!(number, "formatting a non-finite number");
        return ArgValue::Float(number).to_string();
    }

    let negative = number < 0.0;
    let fixed = to_fixed(number.abs(), precision);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part, delimiter));
    if precision > 0 {
        out.push_str(separator);
        out.push_str(frac_part.unwrap_or_default());
    }

    if options.flag("strip_insignificant_zeros") && precision > 0 {
        let trimmed = out.trim_end_matches('0');
        let trimmed = trimmed.strip_suffix(separator).unwrap_or(trimmed);
        out = trimmed.to_string();
    }
    out
}

impl Resolver {
    /// Format `number` using `options`, the locale's `number.format`, then
    /// precision 3, `.` separator, `,` delimiter.
    pub fn to_number(&self, number: f64, options: &Options) -> String {
        let locale = self.requested_locale(options);
        let locale_format = self.locale_options(&locale, "number.format");
        format_number(number, &Options::merge([options, &locale_format]))
    }

    /// `number` followed by `%`. Defaults: precision 3, no delimiter.
    pub fn to_percentage(&self, number: f64, options: &Options) -> String {
        let locale = self.requested_locale(options);
        let percentage = self.locale_options(&locale, "number.percentage.format");
        let general = self.locale_options(&locale, "number.format");
        let defaults = Options::new()
            .with("precision", 3)
            .with("separator", ".")
            .with("delimiter", "");
        let merged = Options::merge([options, &percentage, &general, &defaults]);
        format!("{}%", format_number(number, &merged))
    }

    /// `number` spliced into a `%u%n` currency format. Defaults: unit `$`,
    /// precision 2.
    pub fn to_currency(&self, number: f64, options: &Options) -> String {
        let locale = self.requested_locale(options);
        let currency = self.locale_options(&locale, "number.currency.format");
        let general = self.locale_options(&locale, "number.format");
        let defaults = Options::new()
            .with("unit", "$")
            .with("precision", 2)
            .with("format", "%u%n")
            .with("delimiter", ",")
            .with("separator", ".");
        let merged = Options::merge([options, &currency, &general, &defaults]);
        let formatted = format_number(number, &merged);
        let unit = merged.str_value("unit").unwrap_or("$");
        merged
            .str_value("format")
            .unwrap_or("%u%n")
            .replacen("%u", unit, 1)
            .replacen("%n", &formatted, 1)
    }

    /// Byte count as a localized storage size, e.g. `1.5 KB`.
    pub fn to_human_size(&self, bytes: f64, options: &Options) -> String {
        let mut size = bytes;
        let mut tier = 0;
        while size >= KIB && tier < 4 {
            size /= KIB;
            tier += 1;
        }

        let locale = self.requested_locale(options);
        let mut unit_opts = Options::new().with("locale", locale.clone());
        let precision = if tier == 0 {
            unit_opts.set("count", size);
            0
        } else if size.fract() == 0.0 {
            0
        } else {
            1
        };
        let unit = self.translate(
            format!("number.human.storage_units.units.{}", STORAGE_UNITS[tier]),
            &unit_opts,
        );

        let mut locale_format = Options::new();
        if let Some(format) = self.locale_text(&locale, "number.human.storage_units.format") {
            locale_format.set("format", format);
        }
        let defaults = Options::new()
            .with("precision", precision)
            .with("format", "%n %u")
            .with("delimiter", "");
        let merged = Options::merge([options, &locale_format, &defaults]);

        let number = self.to_number(size, &merged);
        merged
            .str_value("format")
            .unwrap_or("%n %u")
            .replacen("%u", &unit, 1)
            .replacen("%n", &number, 1)
    }
}
