//! Memory unit normalization for scheduler output.

const KILO_PER_MEGA: f64 = 1024.0;

/// Convert a memory value with an optional unit suffix to megabytes.
///
/// Recognized suffixes are K, M, G and T (case-insensitive). A value with
/// no recognized suffix is taken to be in kilobytes, which is what the
/// accounting tools report by default.
pub fn normalize_memory(value: f64, unit: Option<char>) -> f64 {
    match unit.map(|u| u.to_ascii_uppercase()) {
        Some('K') => value / KILO_PER_MEGA,
        Some('M') => value,
        Some('G') => value * KILO_PER_MEGA,
        Some('T') => value * KILO_PER_MEGA * KILO_PER_MEGA,
        _ => value / KILO_PER_MEGA,
    }
}

/// Parse a memory string such as "2048K", "1.5G" or "512" into megabytes.
///
/// Returns None for empty strings, placeholders and non-numeric values.
pub fn parse_memory_megabytes(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }

    let last = s.chars().last()?;
    let (number, unit) = if last.is_ascii_alphabetic() {
        (&s[..s.len() - last.len_utf8()], Some(last))
    } else {
        (s, None)
    };

    let value: f64 = number.trim().parse().ok()?;
    Some(normalize_memory(value, unit))
}
