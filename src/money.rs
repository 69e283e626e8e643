//! Money and percentage helpers.
//!
//! Every balance, fee, stake and payout is a `Decimal` rupee amount.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{LedgerError, LedgerResult};

/// Rupee amount. Two decimal places are typical but not enforced.
pub type Money = Decimal;

/// Percent value in `[0, 100]`.
pub type Percent = Decimal;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `1 - percent / 100`, the share left after the platform takes its cut.
#[inline]
pub fn commission_factor(commission_percent: Percent) -> Decimal {
    Decimal::ONE - commission_percent / HUNDRED
}

/// `amount * percent / 100`. The fraction is taken first so the product
/// never exceeds `amount` for percentages up to 100.
#[inline]
pub fn percent_of(amount: Money, percent: Percent) -> Money {
    amount * (percent / HUNDRED)
}

/// `a + b`, or `Overflow` instead of a panic.
#[inline]
pub fn checked_add(a: Money, b: Money) -> LedgerResult<Money> {
    a.checked_add(b).ok_or(LedgerError::Overflow(b))
}

/// `a * b`, or `Overflow` instead of a panic.
#[inline]
pub fn checked_mul(a: Money, b: Decimal) -> LedgerResult<Money> {
    a.checked_mul(b).ok_or(LedgerError::Overflow(a))
}

/// Truncate to whole paise, toward zero.
#[inline]
pub fn to_paise(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// True when `percent` lies in `[0, 100]`.
#[inline]
pub fn is_valid_percent(percent: Percent) -> bool {
    percent >= Decimal::ZERO && percent <= HUNDRED
}
