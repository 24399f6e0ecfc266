//! Fixed-precision arithmetic primitives shared by indicators and metrics.
//!
//! All functions operate on [`Decimal`] and follow the engine-wide
//! conventions: degenerate inputs (division by zero, roots and logarithms of
//! non-positive values) yield zero instead of erroring, and overflow
//! saturates. The underlying `sqrt`/`ln`/`exp`/`pow` come from
//! `rust_decimal`'s `maths` feature, which iterates on the full 28-digit
//! mantissa.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

/// Square root; zero for non-positive input.
pub fn sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value.sqrt().unwrap_or(Decimal::ZERO)
}

/// Natural logarithm; zero for non-positive input.
pub fn ln(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value.checked_ln().unwrap_or(Decimal::ZERO)
}

/// Exponential, saturating at `Decimal::MAX` on overflow.
pub fn exp(value: Decimal) -> Decimal {
    value.checked_exp().unwrap_or(Decimal::MAX)
}

/// `base` raised to a decimal exponent; zero when undefined or overflowing.
pub fn pow(base: Decimal, exponent: Decimal) -> Decimal {
    base.checked_powd(exponent).unwrap_or(Decimal::ZERO)
}

/// Division with the engine-wide zero-denominator convention.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Round half away from zero to `dp` decimal places.
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

pub fn floor(value: Decimal) -> Decimal {
    value.floor()
}

pub fn ceil(value: Decimal) -> Decimal {
    value.ceil()
}

/// Sign of the value: -1, 0 or 1.
pub fn sign(value: Decimal) -> i32 {
    if value > Decimal::ZERO {
        1
    } else if value < Decimal::ZERO {
        -1
    } else {
        0
    }
}
