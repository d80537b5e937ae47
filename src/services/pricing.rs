//! Team pricing.
//!
//! Orders for more than one person get a flat 10% bundle discount on the
//! multiplied total. Amounts are integer cents and always rounded down so
//! the displayed estimate matches what the service charges.

/// Bundle discount, expressed as the fraction of the gross that is kept.
const BUNDLE_NUMERATOR: u64 = 9;
const BUNDLE_DENOMINATOR: u64 = 10;

/// Price in cents for `team_size` seats of a package costing `base_price_cents`.
pub fn estimate(base_price_cents: u64, team_size: u32) -> u64 {
    if team_size <= 1 {
        return base_price_cents;
    }
    let gross = base_price_cents.saturating_mul(u64::from(team_size));
    // Integer floor of gross * 0.9
    gross / BUNDLE_DENOMINATOR * BUNDLE_NUMERATOR
        + gross % BUNDLE_DENOMINATOR * BUNDLE_NUMERATOR / BUNDLE_DENOMINATOR
}

/// Whole-dollar display of a cent amount, e.g. `$41`.
pub fn format_usd(cents: u64) -> String {
    format!("${}", (cents as f64 / 100.0).round() as u64)
}
