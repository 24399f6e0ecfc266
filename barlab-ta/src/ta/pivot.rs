//! Confirmed pivot detection.

use super::value;
use crate::series::{Series, nz};
use rust_decimal::Decimal;

/// Pivot high confirmed `rightbars` bars after the candidate peak.
///
/// Returns the candidate value at offset `rightbars` when it is greater than
/// or equal to every value `leftbars` to its left and `rightbars` to its
/// right, absent otherwise. Confirmation lags the peak, so there is no
/// look-ahead.
pub fn pivothigh(
    source: &Series<Decimal>,
    leftbars: usize,
    rightbars: usize,
) -> Option<Decimal> {
    if source.len() < leftbars + rightbars {
        return None;
    }

    let candidate = value(source, rightbars).ok().flatten()?;

    // Right side: nothing newer may exceed the candidate.
    for i in 0..rightbars {
        let v = value(source, i).ok()?;
        if nz(v) > candidate {
            return None;
        }
    }

    // Left side.
    for i in (rightbars + 1)..=(rightbars + leftbars) {
        let v = value(source, i).ok()?;
        if nz(v) > candidate {
            return None;
        }
    }

    Some(candidate)
}

/// Pivot low confirmed `rightbars` bars after the candidate trough.
pub fn pivotlow(
    source: &Series<Decimal>,
    leftbars: usize,
    rightbars: usize,
) -> Option<Decimal> {
    if source.len() < leftbars + rightbars {
        return None;
    }

    let candidate = value(source, rightbars).ok().flatten()?;

    for i in 0..rightbars {
        let v = value(source, i).ok()?;
        if nz(v) < candidate {
            return None;
        }
    }

    for i in (rightbars + 1)..=(rightbars + leftbars) {
        let v = value(source, i).ok()?;
        if nz(v) < candidate {
            return None;
        }
    }

    Some(candidate)
}
