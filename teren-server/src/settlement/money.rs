//! Money calculation utilities using rust_decimal for precision
//!
//! All settlement arithmetic runs on `Decimal` internally and converts to
//! `f64` only at the storage/serialization boundary.

use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round to the monetary precision
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `base * percent / 100`, rounded to monetary precision
pub fn percent_of(base: Decimal, percent: f64) -> Decimal {
    round_money(base * to_decimal(percent) / Decimal::ONE_HUNDRED)
}

/// Split an amount evenly across `n` recipients so the shares sum to the
/// amount exactly: every share is rounded down to a cent and the remainder
/// goes to the last recipient.
pub fn split_even(total: Decimal, n: usize) -> Vec<Decimal> {
    if n == 0 {
        return Vec::new();
    }
    let count = Decimal::from(n as u64);
    let share = (total / count).round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::ToZero);
    let mut shares = vec![share; n];
    shares[n - 1] = total - share * Decimal::from((n - 1) as u64);
    shares
}
