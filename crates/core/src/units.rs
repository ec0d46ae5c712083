//! Human-readable formatting of execution times

/// Format a duration in seconds with the largest SI time unit that keeps the
/// magnitude at or above one, to two decimal places.
///
/// The value may be negative (e.g. a delta between two runs); the unit is
/// chosen on its absolute value. Zero is rendered as a bare `"0"`.
/// Non-finite values are rendered without a unit.
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let abs = value.abs();
    if abs < 1e-9 {
        format!("{:.2} ps", value * 1e12)
    } else if abs < 1e-6 {
        format!("{:.2} ns", value * 1e9)
    } else if abs < 1e-3 {
        format!("{:.2} µs", value * 1e6)
    } else if abs < 1.0 {
        format!("{:.2} ms", value * 1e3)
    } else {
        format!("{:.2} s", value)
    }
}
