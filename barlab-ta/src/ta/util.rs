//! Bar-state utilities over condition and value series.

use super::value;
use crate::series::{Series, nz};
use rust_decimal::Decimal;

/// True when the source has risen strictly for `length` consecutive bars.
pub fn rising(source: &Series<Decimal>, length: usize) -> bool {
    for i in 0..length {
        let (Ok(current), Ok(previous)) = (value(source, i), value(source, i + 1)) else {
            return false;
        };
        if nz(current) <= nz(previous) {
            return false;
        }
    }
    true
}

/// True when the source has fallen strictly for `length` consecutive bars.
pub fn falling(source: &Series<Decimal>, length: usize) -> bool {
    for i in 0..length {
        let (Ok(current), Ok(previous)) = (value(source, i), value(source, i + 1)) else {
            return false;
        };
        if nz(current) >= nz(previous) {
            return false;
        }
    }
    true
}

/// Bars since the condition was last true; `-1` when it never was within the
/// reachable window.
pub fn barssince(condition: &Series<bool>) -> i64 {
    if let Ok(Some(true)) = condition.current() {
        return 0;
    }
    for i in 1..=condition.len() as i64 {
        match condition.get(i) {
            Ok(Some(true)) => return i,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    -1
}

/// Value of `source` at the bar where `condition` was true, `occurrence`
/// occurrences ago (`0` = most recent). Zero when no such bar exists.
pub fn valuewhen(
    condition: &Series<bool>,
    source: &Series<Decimal>,
    occurrence: usize,
) -> Decimal {
    let mut count = 0;

    if let Ok(Some(true)) = condition.current() {
        if count == occurrence {
            return nz(source.current().ok().flatten());
        }
        count += 1;
    }

    let reachable = condition.len().min(source.len());
    for i in 1..=reachable as i64 {
        match condition.get(i) {
            Ok(Some(true)) => {
                if count == occurrence {
                    return nz(source.get(i).ok().flatten());
                }
                count += 1;
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }

    Decimal::ZERO
}
