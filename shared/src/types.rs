//! Common numeric helpers

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};

/// Kilograms per quintal, the pricing unit
pub const KG_PER_QUINTAL: i64 = 100;

/// Round half away from zero to a whole number.
///
/// `Decimal::round` uses banker's rounding, which would turn 2.5 into 2;
/// prices and quantities here round 0.5 upward.
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to a whole number and convert to i64, saturating on overflow
pub fn round_to_i64(value: Decimal) -> i64 {
    let rounded = round_half_up(value);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn value_overflow() -> EngineError {
    EngineError::invalid("quantity_kg", "lot value is too large to compute")
}

/// Value of `quantity_kg` sold at `price_per_qtl`, rounded to whole currency
pub fn quintal_value(quantity_kg: i64, price_per_qtl: Decimal) -> EngineResult<Decimal> {
    let quintals = Decimal::from(quantity_kg) / Decimal::from(KG_PER_QUINTAL);
    quintals
        .checked_mul(price_per_qtl)
        .map(round_half_up)
        .ok_or_else(value_overflow)
}

/// Sum of values, failing instead of overflowing
pub fn checked_total<'a>(values: impl IntoIterator<Item = &'a Decimal>) -> EngineResult<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(value_overflow)
}

/// Percentage of `part` in `whole`, rounded; zero when `whole` is zero
pub fn percent_of(part: Decimal, whole: Decimal) -> i64 {
    if whole.is_zero() {
        return 0;
    }
    match part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::from(100)))
    {
        Some(percent) => round_to_i64(percent),
        None if part.is_sign_negative() != whole.is_sign_negative() => i64::MIN,
        None => i64::MAX,
    }
}

/// Round an f64 to `places` decimal places for display fields
pub fn round_f64(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
