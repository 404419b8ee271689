//! Position sizing for options trades: fixed maximum dollar risk.

/// Number of contracts such that hitting the stop loses at most
/// `max_dollar_risk`:
///
/// ```text
/// stop_distance = (stop_loss_pct / 100) * premium
/// qty = max_dollar_risk / (stop_distance * 100)
/// ```
///
/// The x100 accounts for the options multiplier (one contract = 100
/// shares). Always at least 1 contract; degenerate inputs (non-positive
/// premium or stop percentage) also size to 1.
pub fn options_qty(max_dollar_risk: f64, stop_loss_pct: f64, premium: f64) -> u32 {
    if premium <= 0.0 || stop_loss_pct <= 0.0 {
        return 1;
    }
    let stop_distance = (stop_loss_pct / 100.0) * premium;
    if stop_distance <= 0.0 {
        return 1;
    }
    let qty = max_dollar_risk / (stop_distance * 100.0);
    (qty as u32).max(1)
}
