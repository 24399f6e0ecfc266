//! Oscillators.

use super::value;
use super::{ma::sma, stat::{highest, lowest}};
use crate::series::{Series, nz};
use rust_decimal::Decimal;

/// Relative Strength Index via Wilder-style averaging of gains and losses.
///
/// Returns the neutral `50` until `length` bars exist, `100` when there are
/// no losses in the window.
pub fn rsi(source: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 || source.len() < length {
        return Decimal::from(50);
    }

    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;
    for i in 0..length {
        let (Ok(current), Ok(previous)) = (value(source, i), value(source, i + 1)) else {
            continue;
        };
        let change = nz(current) - nz(previous);
        if change > Decimal::ZERO {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / Decimal::from(length as u64);
    let avg_loss = losses / Decimal::from(length as u64);

    if avg_loss.is_zero() {
        return Decimal::ONE_HUNDRED;
    }

    let rs = avg_gain / avg_loss;
    Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs)
}

/// Stochastic %K: `100 * (source - lowest low) / (highest high - lowest low)`.
pub fn stoch(
    source: &Series<Decimal>,
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    length: usize,
) -> Decimal {
    let hi = highest(high, length);
    let lo = lowest(low, length);
    let range = hi - lo;
    if range.is_zero() {
        return Decimal::ZERO;
    }
    let current = nz(source.current().ok().flatten());
    Decimal::ONE_HUNDRED * (current - lo) / range
}

/// Williams %R: `-100 * (highest - close) / (highest - lowest)`.
pub fn wpr(
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
    length: usize,
) -> Decimal {
    let hi = highest(high, length);
    let lo = lowest(low, length);
    let range = hi - lo;
    if range.is_zero() {
        return Decimal::ZERO;
    }
    let current = nz(close.current().ok().flatten());
    -Decimal::ONE_HUNDRED * (hi - current) / range
}

/// Commodity Channel Index: `(source - sma) / (0.015 * mean deviation)`.
pub fn cci(source: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 || source.len() + 1 < length {
        return Decimal::ZERO;
    }

    let mean = sma(source, length);

    let mut deviation_sum = Decimal::ZERO;
    for i in 0..length {
        match value(source, i) {
            Ok(v) => deviation_sum += (nz(v) - mean).abs(),
            Err(_) => return Decimal::ZERO,
        }
    }

    let mean_deviation = deviation_sum / Decimal::from(length as u64);
    if mean_deviation.is_zero() {
        return Decimal::ZERO;
    }

    let current = nz(source.current().ok().flatten());
    (current - mean) / (Decimal::new(15, 3) * mean_deviation)
}

/// Money Flow Index: RSI-like oscillator on `typical price * volume`.
///
/// Returns the neutral `50` during warmup, `100` when no negative flow
/// exists in the window.
pub fn mfi(
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
    volume: &Series<Decimal>,
    length: usize,
) -> Decimal {
    if length == 0 || close.len() < length {
        return Decimal::from(50);
    }

    let three = Decimal::from(3);
    let mut positive_flow = Decimal::ZERO;
    let mut negative_flow = Decimal::ZERO;

    for i in 0..length {
        let (Ok(h), Ok(l), Ok(c), Ok(v)) = (
            value(high, i),
            value(low, i),
            value(close, i),
            value(volume, i),
        ) else {
            continue;
        };
        let (Ok(prev_h), Ok(prev_l), Ok(prev_c)) = (
            value(high, i + 1),
            value(low, i + 1),
            value(close, i + 1),
        ) else {
            continue;
        };

        let typical = (nz(h) + nz(l) + nz(c)) / three;
        let prev_typical = (nz(prev_h) + nz(prev_l) + nz(prev_c)) / three;
        let raw_flow = typical * nz(v);

        if typical > prev_typical {
            positive_flow += raw_flow;
        } else {
            negative_flow += raw_flow;
        }
    }

    if negative_flow.is_zero() {
        return Decimal::ONE_HUNDRED;
    }

    let flow_ratio = positive_flow / negative_flow;
    Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + flow_ratio)
}

/// Momentum: difference between the current value and `length` bars ago.
pub fn mom(source: &Series<Decimal>, length: usize) -> Decimal {
    super::stat::change(source, length)
}

/// Rate of Change as a percentage of the value `length` bars ago.
pub fn roc(source: &Series<Decimal>, length: usize) -> Decimal {
    let Ok(prev) = value(source, length) else {
        return Decimal::ZERO;
    };
    let prev = nz(prev);
    if prev.is_zero() {
        return Decimal::ZERO;
    }
    let current = nz(source.current().ok().flatten());
    Decimal::ONE_HUNDRED * (current - prev) / prev
}
