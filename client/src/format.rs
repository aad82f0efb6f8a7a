//! Display-boundary formatting.
//!
//! The only place money is rounded. Summation everywhere else runs on raw
//! values so rounding error cannot compound across phases.

use chrono::DateTime;

/// Currency string with two decimals, e.g. `$350.00` / `-$20.00`.
pub fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

/// Pending balances display as zero once fully paid; the raw (possibly
/// negative) value stays available upstream for over-payment detection.
pub fn format_pending_balance(balance: f64) -> String {
    format_amount(balance.max(0.0))
}

/// `dd/mm/yyyy` from an ISO-8601 timestamp; unparseable input is shown
/// verbatim rather than dropped.
pub fn format_date(iso: &str) -> String {
    DateTime::parse_from_rfc3339(iso)
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| iso.to_string())
}
