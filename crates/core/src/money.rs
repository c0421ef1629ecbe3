//! Exact decimal money helpers.
//!
//! All prices and totals are `rust_decimal::Decimal` and travel over JSON as
//! strings. The canonical form carries two fractional digits ("25.50").
//!
//! Stored amounts fit `decimal(10,2)` and percentages fit `decimal(5,2)`.
//! Arithmetic is checked; a result past either bound is a `Validation`
//! error on the field being computed.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

/// Fractional digits kept for money and percentages.
pub const MONEY_SCALE: u32 = 2;

/// Largest magnitude of a money amount: 99999999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E3FF, 2, 0, false, MONEY_SCALE);

/// Largest magnitude of a percentage: 999.99.
pub const MAX_PERCENTAGE: Decimal = Decimal::from_parts(99_999, 0, 0, false, MONEY_SCALE);

/// Round half away from zero to two places and pad to exactly two places.
pub fn canonical(value: Decimal) -> Decimal {
    let mut v = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(MONEY_SCALE);
    v
}

/// Canonicalize an amount reported as `field`, rejecting it past [`MAX_AMOUNT`].
pub fn check_amount(field: &str, value: Decimal) -> DomainResult<Decimal> {
    bounded(field, value, MAX_AMOUNT)
}

/// Canonicalize a percentage reported as `field`, rejecting it past [`MAX_PERCENTAGE`].
pub fn check_percentage(field: &str, value: Decimal) -> DomainResult<Decimal> {
    bounded(field, value, MAX_PERCENTAGE)
}

/// `quantity × rate`, canonicalized. Errors are reported on `amount`.
pub fn line_amount(quantity: i64, rate: Decimal) -> DomainResult<Decimal> {
    let raw = Decimal::from(quantity)
        .checked_mul(rate)
        .ok_or_else(|| out_of_range("amount", MAX_AMOUNT))?;
    check_amount("amount", raw)
}

/// `amount × percentage / 100`, canonicalized. Errors are reported on `taxAmount`.
pub fn percentage_of(amount: Decimal, percentage: Decimal) -> DomainResult<Decimal> {
    let raw = amount
        .checked_mul(percentage)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| out_of_range("taxAmount", MAX_AMOUNT))?;
    check_amount("taxAmount", raw)
}

/// Sum of `values`, canonicalized and reported as `field`.
pub fn sum(field: &str, values: impl IntoIterator<Item = Decimal>) -> DomainResult<Decimal> {
    let total = values
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or_else(|| out_of_range(field, MAX_AMOUNT))?;
    check_amount(field, total)
}

fn bounded(field: &str, value: Decimal, limit: Decimal) -> DomainResult<Decimal> {
    let v = canonical(value);
    if v.abs() > limit {
        return Err(out_of_range(field, limit));
    }
    Ok(v)
}

fn out_of_range(field: &str, limit: Decimal) -> DomainError {
    DomainError::validation(field, format!("{field} must be at most {limit} in magnitude"))
}
