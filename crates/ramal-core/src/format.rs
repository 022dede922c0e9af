//! Rupiah display formatting

use crate::engine::ForecastOutcome;

/// Format an amount as `Rp. 1.234.567`
///
/// Rounds to the nearest integer, halves away from zero. Returns `None` for
/// NaN, infinities, and values too large to render as whole rupiah.
pub fn format_rupiah(value: f64) -> Option<String> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded.abs() >= i64::MAX as f64 {
        return None;
    }
    let whole = rounded as i64;

    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if whole < 0 { "-" } else { "" };
    Some(format!("Rp. {}{}", sign, grouped))
}

/// Display string for a category outcome
pub fn render(outcome: &ForecastOutcome) -> String {
    match outcome {
        Ok(value) => format_rupiah(*value)
            .unwrap_or_else(|| format!("Error: forecast is not a finite amount ({})", value)),
        Err(e) => format!("Error: {}", e),
    }
}
