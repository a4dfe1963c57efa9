//! Engineering units and SI prefix handling.

/// SPICE multipliers, largest first. `Meg` is mega; a bare `m` is milli.
const SPICE_PREFIXES: [(f64, &str); 10] = [
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "Meg"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "u"),
    (1e-9, "n"),
    (1e-12, "p"),
    (1e-15, "f"),
];

/// Parse a SPICE-style value with optional SI suffix.
///
/// Supported suffixes (case-insensitive):
/// - T (tera, 1e12)
/// - G (giga, 1e9)
/// - MEG (mega, 1e6)
/// - K (kilo, 1e3)
/// - M (milli, 1e-3)
/// - U (micro, 1e-6)
/// - N (nano, 1e-9)
/// - P (pico, 1e-12)
/// - F (femto, 1e-15)
///
/// Trailing unit letters after the multiplier (`10nF`, `1kOhm`) are ignored,
/// as SPICE does.
pub fn parse_value(s: &str) -> Option<f64> {
    let s = s.trim().to_uppercase();

    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-' && c != '+' && c != 'E')
        .unwrap_or(s.len());

    if num_end == 0 {
        return None;
    }

    let (num_str, suffix) = s.split_at(num_end);
    let value: f64 = num_str.parse().ok()?;

    let multiplier = if suffix.starts_with("MEG") {
        1e6
    } else if suffix.starts_with("MIL") {
        25.4e-6
    } else {
        match suffix.chars().next() {
            Some('T') => 1e12,
            Some('G') => 1e9,
            Some('K') => 1e3,
            Some('M') => 1e-3,
            Some('U') => 1e-6,
            Some('N') => 1e-9,
            Some('P') => 1e-12,
            Some('F') => 1e-15,
            Some(c) if c.is_ascii_alphabetic() => 1.0,
            _ => return None,
        }
    };

    Some(value * multiplier)
}

/// Format a value for a netlist using SPICE suffix notation (`10m`, `10n`, `1Meg`).
///
/// The mantissa is the shortest decimal that reads back to `value` within two
/// ulps, so the simulator sees the circuit the analytical model uses. Values
/// below the femto range are written in exponent form.
pub fn format_spice_value(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }

    let abs_value = value.abs();
    match SPICE_PREFIXES
        .iter()
        .copied()
        .find(|&(m, _)| abs_value >= m * (1.0 - 1e-9))
    {
        Some((multiplier, suffix)) => format!("{}{}", mantissa(value, multiplier), suffix),
        None => format!("{:e}", value),
    }
}

/// Shortest fixed-point rendering of `value / multiplier` that reads back.
fn mantissa(value: f64, multiplier: f64) -> String {
    let scaled = value / multiplier;
    for decimals in 0..=17 {
        let text = trim_decimal(&format!("{:.*}", decimals, scaled));
        if let Ok(m) = text.parse::<f64>() {
            if (m * multiplier - value).abs() <= value.abs() * 2.0 * f64::EPSILON {
                return text;
            }
        }
    }
    format!("{}", scaled)
}

/// Format a value with an SI prefix and unit for human-readable output.
pub fn format_value(value: f64, unit: &str) -> String {
    let abs_value = value.abs();

    let (scaled, prefix) = if abs_value >= 1e9 {
        (value / 1e9, "G")
    } else if abs_value >= 1e6 {
        (value / 1e6, "M")
    } else if abs_value >= 1e3 {
        (value / 1e3, "k")
    } else if abs_value >= 1.0 || abs_value == 0.0 {
        (value, "")
    } else if abs_value >= 1e-3 {
        (value * 1e3, "m")
    } else if abs_value >= 1e-6 {
        (value * 1e6, "u")
    } else if abs_value >= 1e-9 {
        (value * 1e9, "n")
    } else {
        (value * 1e12, "p")
    };

    format!("{:.3} {}{}", scaled, prefix, unit)
}

fn trim_decimal(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
