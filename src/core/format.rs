//! Metric value formatting
//!
//! Turns a raw metric value into display text according to the metric's
//! unit table and the currency/gwei/cents toggles. Never fails: a metric
//! without the requested unit renders with 2 decimals and no affixes.

use super::master::{MetricDescriptor, FALLBACK_DECIMALS, UNIT_USD};

/// Text shown for absent values
pub const ABSENT: &str = "N/A";

const GWEI_MULTIPLIER: f64 = 1e9;
const CENTS_MULTIPLIER: f64 = 100.0;
const GWEI_DECIMALS: u32 = 2;

/// Smallest USD value shown as a number, with its display text
const USD_FLOOR: (f64, &str) = (0.001, "0.001");
/// Smallest cents value shown as a number, with its display text
const CENTS_FLOOR: (f64, &str) = (0.1, "0.1");

/// Display toggles affecting formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    pub show_usd: bool,
    pub show_gwei: bool,
    pub show_cents: bool,
    /// Compact SI notation for chart axes
    pub is_axis_label: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    Plain,
    Gwei,
    Cents,
}

/// Multiplier, decimals and affixes after applying the toggles.
#[derive(Debug, Clone, PartialEq)]
struct UnitDisplay {
    multiplier: f64,
    decimals: u32,
    prefix: String,
    suffix: String,
    floor: Option<(f64, &'static str)>,
}

impl UnitDisplay {
    fn resolve(metric: &MetricDescriptor, opts: FormatOptions) -> Self {
        let key = metric.unit_key(opts.show_usd);
        let unit = metric.unit(key);

        let scale = match (metric.currency, opts.show_usd) {
            (true, false) if opts.show_gwei => Scale::Gwei,
            (true, true) if opts.show_cents => Scale::Cents,
            _ => Scale::Plain,
        };

        match scale {
            Scale::Gwei => Self {
                multiplier: GWEI_MULTIPLIER,
                decimals: GWEI_DECIMALS,
                prefix: String::new(),
                suffix: " gwei".to_string(),
                floor: None,
            },
            Scale::Cents => Self {
                multiplier: CENTS_MULTIPLIER,
                decimals: metric.decimals(UNIT_USD).saturating_sub(2),
                prefix: String::new(),
                suffix: " cents".to_string(),
                floor: Some(CENTS_FLOOR),
            },
            Scale::Plain => {
                let (decimals, prefix, suffix) = match unit {
                    Some(u) => (
                        u.decimals.unwrap_or(FALLBACK_DECIMALS),
                        u.prefix.clone().unwrap_or_default(),
                        u.suffix.clone().unwrap_or_default(),
                    ),
                    None => (FALLBACK_DECIMALS, String::new(), String::new()),
                };
                let floor = (metric.currency && opts.show_usd).then_some(USD_FLOOR);
                Self {
                    multiplier: 1.0,
                    decimals,
                    prefix,
                    suffix,
                    floor,
                }
            }
        }
    }
}

/// Format `value` for display.
pub fn format_value(value: f64, metric: &MetricDescriptor, opts: FormatOptions) -> String {
    if !value.is_finite() {
        return ABSENT.to_string();
    }

    let unit = UnitDisplay::resolve(metric, opts);
    let scaled = value * unit.multiplier;

    if let Some((floor, floor_text)) = unit.floor {
        if scaled > 0.0 && scaled < floor {
            return format!("< {}{}{}", unit.prefix, floor_text, unit.suffix);
        }
    }

    let body = if opts.is_axis_label {
        axis_number(scaled, metric.currency, unit.decimals)
    } else {
        grouped_fixed(scaled, unit.decimals)
    };

    let (sign, body) = match body.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", body.as_str()),
    };
    format!("{}{}{}{}", sign, unit.prefix, body, unit.suffix)
}

/// Like [`format_value`], rendering `None` as [`ABSENT`].
pub fn format_optional(value: Option<f64>, metric: &MetricDescriptor, opts: FormatOptions) -> String {
    match value {
        Some(v) => format_value(v, metric, opts),
        None => ABSENT.to_string(),
    }
}

/// Fixed decimals with `,` thousands separators (en-US style).
fn grouped_fixed(value: f64, decimals: u32) -> String {
    let text = format!("{:.*}", decimals as usize, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    if value < 0.0 && text.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Compact axis notation: k/M/B above a thousand, finer steps for small currency values.
fn axis_number(value: f64, currency: bool, decimals: u32) -> String {
    let abs = value.abs();
    let body = if abs >= 1e9 {
        format!("{}B", trim_zeros(format!("{:.1}", abs / 1e9)))
    } else if abs >= 1e6 {
        format!("{}M", trim_zeros(format!("{:.1}", abs / 1e6)))
    } else if abs >= 1e3 {
        format!("{}k", trim_zeros(format!("{:.1}", abs / 1e3)))
    } else if currency {
        if abs < 1.0 {
            trim_zeros(format!("{:.*}", decimals as usize, abs))
        } else if abs < 10.0 {
            trim_zeros(format!("{:.2}", abs))
        } else if abs < 100.0 {
            trim_zeros(format!("{:.1}", abs))
        } else {
            format!("{:.0}", abs)
        }
    } else {
        trim_zeros(format!("{:.2}", abs))
    };

    if value < 0.0 && body != "0" {
        format!("-{}", body)
    } else {
        body
    }
}

fn trim_zeros(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
