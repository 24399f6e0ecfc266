//! Moving averages.

use super::value;
use crate::series::{Series, nz};
use rust_decimal::Decimal;

/// Simple Moving Average of the last `length` values.
pub fn sma(source: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 || source.len() + 1 < length {
        return Decimal::ZERO;
    }

    let Ok(current) = source.current() else {
        return Decimal::ZERO;
    };
    let mut total = nz(current);
    for i in 1..length {
        match value(source, i) {
            Ok(v) => total += nz(v),
            Err(_) => return Decimal::ZERO,
        }
    }

    total / Decimal::from(length as u64)
}

/// Exponential Moving Average with `alpha = 2 / (length + 1)`.
///
/// Bootstrapped with the SMA of the first `length` values; once enough
/// history exists the previous EMA is reconstructed from a bounded window of
/// committed values.
pub fn ema(source: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 {
        return Decimal::ZERO;
    }
    if source.len() < 1 {
        return nz(source.current().ok().flatten());
    }

    let alpha = Decimal::TWO / Decimal::from(length as u64 + 1);

    if source.len() < length {
        return sma(source, length.min(source.len() + 1));
    }

    let depth = (length * 3).min(source.len());
    let prev_ema = ema_from_history(source, length, alpha, 1, depth);
    alpha * nz(source.current().ok().flatten()) + (Decimal::ONE - alpha) * prev_ema
}

/// Wilder's Moving Average with `alpha = 1 / length`.
pub fn rma(source: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 {
        return Decimal::ZERO;
    }
    let alpha = Decimal::ONE / Decimal::from(length as u64);
    let depth = (length * 3).min(source.len().max(1));
    ema_from_history(source, length, alpha, 0, depth)
}

/// Smoothed Moving Average, identical to [`rma`].
pub fn smma(source: &Series<Decimal>, length: usize) -> Decimal {
    rma(source, length)
}

/// Weighted Moving Average; the weight of the value `i` bars back is
/// `length - i`.
pub fn wma(source: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 || source.len() + 1 < length {
        return Decimal::ZERO;
    }

    let mut weighted_sum = Decimal::ZERO;
    let mut weight_sum = Decimal::ZERO;
    for i in 0..length {
        let weight = Decimal::from((length - i) as u64);
        match value(source, i) {
            Ok(v) => {
                weighted_sum += weight * nz(v);
                weight_sum += weight;
            }
            Err(_) => return Decimal::ZERO,
        }
    }

    weighted_sum / weight_sum
}

/// Hull Moving Average in its two-term form `2 * wma(n/2) - wma(n)`.
pub fn hma(source: &Series<Decimal>, length: usize) -> Decimal {
    let half_length = (length / 2).max(1);
    Decimal::TWO * wma(source, half_length) - wma(source, length)
}

/// Volume-Weighted Moving Average.
pub fn vwma(source: &Series<Decimal>, volume: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 || source.len() + 1 < length || volume.len() + 1 < length {
        return Decimal::ZERO;
    }

    let mut pv_sum = Decimal::ZERO;
    let mut v_sum = Decimal::ZERO;
    for i in 0..length {
        match (value(source, i), value(volume, i)) {
            (Ok(p), Ok(v)) => {
                pv_sum += nz(p) * nz(v);
                v_sum += nz(v);
            }
            _ => return Decimal::ZERO,
        }
    }

    if v_sum.is_zero() {
        return Decimal::ZERO;
    }
    pv_sum / v_sum
}

/// Reconstruct an EMA value at `offset` by seeding with an SMA at a bounded
/// depth and folding the recurrence forward to the requested offset.
fn ema_from_history(
    source: &Series<Decimal>,
    length: usize,
    alpha: Decimal,
    offset: usize,
    max_depth: usize,
) -> Decimal {
    let available = source.len();
    let base_offset = offset.max(max_depth.min(available));

    let mut total = Decimal::ZERO;
    let mut count: u64 = 0;
    for i in base_offset..(base_offset + length).min(available) {
        if let Ok(Some(v)) = value(source, i) {
            total += v;
            count += 1;
        }
    }
    let mut ema_value = total / Decimal::from(count.max(1));

    for i in (offset..base_offset).rev() {
        let v = nz(value(source, i).ok().flatten());
        ema_value = alpha * v + (Decimal::ONE - alpha) * ema_value;
    }

    ema_value
}
