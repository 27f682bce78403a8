//! Money and rate helpers.
//!
//! Amounts are stored with two decimal places, tax rates with four and
//! exchange rates with six.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

/// Maximum tolerated difference between total debits and total credits.
pub const BALANCE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

pub const AMOUNT_SCALE: u32 = 2;
pub const RATE_SCALE: u32 = 4;
pub const EXCHANGE_RATE_SCALE: u32 = 6;

/// Decimal places a stored amount, price or quantity may carry.
pub const STORED_SCALE: u32 = 4;

/// Exclusive bound on a stored amount or unit price: `NUMERIC(18, 4)`.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(0x107A_4000, 0x5AF3, 0, false, 0);

/// Exclusive bound on an invoice line quantity: `NUMERIC(12, 4)`.
pub const QUANTITY_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Round a monetary amount to storage precision (half away from zero).
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a tax rate to storage precision.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `true` when two amounts are equal within [`BALANCE_EPSILON`].
pub fn nearly_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= BALANCE_EPSILON
}

/// Reject a value that would not fit its column: magnitude at or above
/// `limit`, or more than [`STORED_SCALE`] decimal places.
pub fn check_stored(field: &str, value: Decimal, limit: Decimal) -> DomainResult<()> {
    if value.abs() >= limit {
        return Err(DomainError::validation(format!(
            "{field} must be less than {limit} in magnitude"
        )));
    }
    if value.normalize().scale() > STORED_SCALE {
        return Err(DomainError::validation(format!(
            "{field} cannot have more than {STORED_SCALE} decimal places"
        )));
    }
    Ok(())
}

/// Sum without panicking on overflow.
pub fn checked_sum<I>(values: I) -> DomainResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value)
            .ok_or_else(|| DomainError::validation("amount total is out of range"))
    })
}
