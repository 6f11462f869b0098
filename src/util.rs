/// Round to whole milliseconds, the precision best times are kept at
pub fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// `12.345s` style label
pub fn format_secs(secs: f64) -> String {
    format!("{:.3}s", secs)
}
