//! Number formatting for reports

/// Format a value with fixed decimals, or `n/a` when it is missing or not finite
///
/// # Examples
///
/// ```
/// use outfall::util::format::format_value;
///
/// assert_eq!(format_value(Some(12.3456), 2), "12.35");
/// assert_eq!(format_value(None, 2), "n/a");
/// assert_eq!(format_value(Some(f64::NAN), 2), "n/a");
/// ```
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => "n/a".to_string(),
    }
}

/// Format a percentage with one decimal
///
/// ```
/// use outfall::util::format::format_pct;
///
/// assert_eq!(format_pct(Some(41.0)), "41.0%");
/// assert_eq!(format_pct(None), "n/a");
/// ```
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}%", v),
        _ => "n/a".to_string(),
    }
}

/// Value with its unit, if the unit is not empty
pub fn with_unit(value: String, unit: &str) -> String {
    if unit.is_empty() || value == "n/a" {
        value
    } else {
        format!("{} {}", value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_unit() {
        assert_eq!(with_unit("90.00".into(), "mg/L"), "90.00 mg/L");
        assert_eq!(with_unit("7.00".into(), ""), "7.00");
        assert_eq!(with_unit("n/a".into(), "mg/L"), "n/a");
    }
}
