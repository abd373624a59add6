const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Render a byte count in the largest unit below 1024, capped at TB.
///
/// Bytes are printed as an integer; every other unit gets two decimals.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.2} {}", UNITS[unit])
}
