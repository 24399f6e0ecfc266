//! Trend and range measures.

use super::value;
use super::{
    ma::{ema, sma},
    stat::stdev,
};
use crate::math;
use crate::series::{Series, nz};
use rust_decimal::Decimal;

/// Moving Average Convergence Divergence.
///
/// Returns `(macd_line, signal_line, histogram)`. The signal line is the
/// single-bar form: it tracks the MACD line itself rather than smoothing a
/// history of MACD values, so the histogram is always zero. `_signal_length`
/// is accepted for call-site compatibility but does not participate.
pub fn macd(
    source: &Series<Decimal>,
    fast_length: usize,
    slow_length: usize,
    _signal_length: usize,
) -> (Decimal, Decimal, Decimal) {
    let macd_line = ema(source, fast_length) - ema(source, slow_length);
    let signal_line = macd_line;
    (macd_line, signal_line, macd_line - signal_line)
}

/// True range of the current bar.
pub fn tr(
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
) -> Decimal {
    let h = nz(high.current().ok().flatten());
    let l = nz(low.current().ok().flatten());
    match value(close, 1) {
        Ok(prev_close) => true_range(h, l, nz(prev_close)),
        Err(_) => h - l,
    }
}

/// Average True Range: mean of the true ranges of the last `length` bars.
pub fn atr(
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
    length: usize,
) -> Decimal {
    if close.len() < 1 {
        let h = nz(high.current().ok().flatten());
        let l = nz(low.current().ok().flatten());
        return h - l;
    }

    let mut ranges = Vec::with_capacity(length.min(close.len()));
    for i in 0..length.min(close.len()) {
        let (h, l, prev_close) = if i == 0 {
            let (Ok(h), Ok(l)) = (high.current(), low.current()) else {
                break;
            };
            let prev_close = match value(close, 1) {
                Ok(v) => v,
                Err(_) => match close.current() {
                    Ok(v) => v,
                    Err(_) => break,
                },
            };
            (nz(h), nz(l), prev_close)
        } else {
            let (Ok(h), Ok(l)) = (value(high, i), value(low, i)) else {
                break;
            };
            let prev_close = if i + 1 < close.len() {
                value(close, i + 1)
            } else {
                value(close, i)
            };
            let Ok(prev_close) = prev_close else {
                break;
            };
            (nz(h), nz(l), prev_close)
        };

        ranges.push(true_range(h, l, nz(prev_close)));
    }

    if ranges.is_empty() {
        return Decimal::ZERO;
    }
    let count = Decimal::from(ranges.len() as u64);
    ranges.into_iter().sum::<Decimal>() / count
}

/// Bollinger Bands: `(upper, middle, lower)` with `middle = sma` and bands
/// at `mult` population standard deviations.
pub fn bb(
    source: &Series<Decimal>,
    length: usize,
    mult: Decimal,
) -> (Decimal, Decimal, Decimal) {
    let middle = sma(source, length);
    let sd = stdev(source, length);
    (middle + mult * sd, middle, middle - mult * sd)
}

/// Bollinger Band Width: `(upper - lower) / middle`.
pub fn bbw(source: &Series<Decimal>, length: usize, mult: Decimal) -> Decimal {
    let (upper, middle, lower) = bb(source, length, mult);
    math::safe_div(upper - lower, middle)
}

/// Keltner Channels: `(upper, middle, lower)` with `middle = ema` and bands
/// at `mult` ATRs.
pub fn kc(
    source: &Series<Decimal>,
    length: usize,
    mult: Decimal,
    atr_length: usize,
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
) -> (Decimal, Decimal, Decimal) {
    let middle = ema(source, length);
    let atr_value = atr(high, low, close, atr_length);
    (middle + mult * atr_value, middle, middle - mult * atr_value)
}

/// Keltner Channel Width: `(upper - lower) / middle`.
pub fn kcw(
    source: &Series<Decimal>,
    length: usize,
    mult: Decimal,
    atr_length: usize,
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
) -> Decimal {
    let (upper, middle, lower) = kc(source, length, mult, atr_length, high, low, close);
    math::safe_div(upper - lower, middle)
}

/// Directional Movement Index: `(plus_di, minus_di, adx)`.
///
/// The ADX term is the single-period DX of the window. `_adx_smoothing` is
/// accepted for call-site compatibility but does not participate.
pub fn dmi(
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
    di_length: usize,
    _adx_smoothing: usize,
) -> (Decimal, Decimal, Decimal) {
    if di_length == 0 || high.len() < di_length + 1 {
        return (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
    }

    let mut plus_dm_sum = Decimal::ZERO;
    let mut minus_dm_sum = Decimal::ZERO;
    let mut tr_sum = Decimal::ZERO;

    for i in 0..di_length {
        let (Ok(h), Ok(l), Ok(prev_h), Ok(prev_l)) = (
            value(high, i),
            value(low, i),
            value(high, i + 1),
            value(low, i + 1),
        ) else {
            continue;
        };
        let prev_close = if i + 1 <= close.len() {
            value(close, i + 1)
        } else {
            value(close, i)
        };
        let Ok(prev_close) = prev_close else {
            continue;
        };

        let h = nz(h);
        let l = nz(l);
        let up_move = h - nz(prev_h);
        let down_move = nz(prev_l) - l;

        if up_move > down_move && up_move > Decimal::ZERO {
            plus_dm_sum += up_move;
        }
        if down_move > up_move && down_move > Decimal::ZERO {
            minus_dm_sum += down_move;
        }
        tr_sum += true_range(h, l, nz(prev_close));
    }

    if tr_sum.is_zero() {
        return (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
    }

    let plus_di = Decimal::ONE_HUNDRED * plus_dm_sum / tr_sum;
    let minus_di = Decimal::ONE_HUNDRED * minus_dm_sum / tr_sum;

    let di_sum = plus_di + minus_di;
    let adx = if di_sum.is_zero() {
        Decimal::ZERO
    } else {
        Decimal::ONE_HUNDRED * (plus_di - minus_di).abs() / di_sum
    };

    (plus_di, minus_di, adx)
}

/// Supertrend: `(value, direction)` where direction is `1` (bullish) or
/// `-1` (bearish).
///
/// Bands sit at `hl2 +/- factor * atr`; the bullish band (lower) is returned
/// while the close holds above the bar midpoint, the bearish band (upper)
/// otherwise.
pub fn supertrend(
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
    factor: Decimal,
    atr_length: usize,
) -> (Decimal, i32) {
    let atr_value = atr(high, low, close, atr_length);
    let h = nz(high.current().ok().flatten());
    let l = nz(low.current().ok().flatten());
    let hl2 = (h + l) / Decimal::TWO;

    let upper_band = hl2 + factor * atr_value;
    let lower_band = hl2 - factor * atr_value;

    let current_close = nz(close.current().ok().flatten());
    if current_close > hl2 {
        (lower_band, 1)
    } else {
        (upper_band, -1)
    }
}

/// Parabolic SAR with acceleration `start`, stepped by `increment` up to
/// `maximum`.
///
/// The stateful definition is replayed over the committed window each call:
/// the stop ratchets toward the extreme point by the acceleration factor and
/// flips to the opposite side of the market when penetrated.
pub fn sar(
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    start: Decimal,
    increment: Decimal,
    maximum: Decimal,
) -> Decimal {
    // Contiguous window, oldest first.
    let mut highs = Vec::new();
    let mut lows = Vec::new();
    let mut offset = 0i64;
    while let (Ok(h), Ok(l)) = (high.get(offset), low.get(offset)) {
        highs.push(nz(h));
        lows.push(nz(l));
        offset += 1;
    }
    highs.reverse();
    lows.reverse();

    let bars = highs.len();
    if bars < 2 {
        return lows.first().copied().unwrap_or(Decimal::ZERO);
    }

    // Initial trend from the first two bar midpoints.
    let mut is_long = highs[1] + lows[1] >= highs[0] + lows[0];
    let mut sar_value = if is_long { lows[0] } else { highs[0] };
    let mut extreme = if is_long { highs[0] } else { lows[0] };
    let mut acceleration = start;

    for k in 1..bars {
        sar_value += acceleration * (extreme - sar_value);

        if is_long {
            if lows[k] < sar_value {
                // Stop penetrated: flip short.
                is_long = false;
                sar_value = extreme;
                extreme = lows[k];
                acceleration = start;
            } else if highs[k] > extreme {
                extreme = highs[k];
                acceleration = (acceleration + increment).min(maximum);
            }
        } else if highs[k] > sar_value {
            // Stop penetrated: flip long.
            is_long = true;
            sar_value = extreme;
            extreme = highs[k];
            acceleration = start;
        } else if lows[k] < extreme {
            extreme = lows[k];
            acceleration = (acceleration + increment).min(maximum);
        }
    }

    sar_value
}

fn true_range(high: Decimal, low: Decimal, prev_close: Decimal) -> Decimal {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn committed(values: &[Decimal]) -> Series<Decimal> {
        let mut series = Series::new("src", 500);
        for v in values {
            series.set_current(*v);
            series.commit();
        }
        series
    }

    #[test]
    fn test_macd_signal_line_is_single_bar_form() {
        let series = committed(&[
            dec!(10),
            dec!(11),
            dec!(13),
            dec!(12),
            dec!(15),
            dec!(17),
            dec!(16),
            dec!(18),
        ]);
        let (macd_line, signal_line, histogram) = macd(&series, 3, 6, 4);
        assert_eq!(macd_line, ema(&series, 3) - ema(&series, 6));
        // The signal tracks the macd line itself, so the histogram is zero.
        assert_eq!(signal_line, macd_line);
        assert_eq!(histogram, Decimal::ZERO);
    }

    #[test]
    fn test_tr_uses_previous_close() {
        let high = committed(&[dec!(10), dec!(12)]);
        let low = committed(&[dec!(9), dec!(11)]);
        let close = committed(&[dec!(9.5), dec!(11.5)]);
        // max(12-11, |12-9.5|, |11-9.5|) = 2.5
        assert_eq!(tr(&high, &low, &close), dec!(2.5));
    }

    #[test]
    fn test_atr_flat_bars() {
        let high = committed(&[dec!(11); 5]);
        let low = committed(&[dec!(9); 5]);
        let close = committed(&[dec!(10); 5]);
        assert_eq!(atr(&high, &low, &close, 3), dec!(2));
    }

    #[test]
    fn test_bb_bands_are_symmetric() {
        let series = committed(&[dec!(10), dec!(12), dec!(14), dec!(12)]);
        let (upper, middle, lower) = bb(&series, 4, dec!(2));
        assert_eq!(middle, dec!(12));
        assert_eq!(upper - middle, middle - lower);
        assert!(upper > middle);
    }

    #[test]
    fn test_bbw_flat_input() {
        let flat = committed(&[dec!(10); 6]);
        assert_eq!(bbw(&flat, 4, dec!(2)), Decimal::ZERO);
    }

    #[test]
    fn test_kc_bands_are_symmetric() {
        let high = committed(&[dec!(11), dec!(12), dec!(13), dec!(12)]);
        let low = committed(&[dec!(9), dec!(10), dec!(11), dec!(10)]);
        let close = committed(&[dec!(10), dec!(11), dec!(12), dec!(11)]);
        let (upper, middle, lower) = kc(&close, 3, dec!(1.5), 3, &high, &low, &close);
        assert_eq!(upper - middle, middle - lower);
        assert!(upper > lower);
    }

    #[test]
    fn test_dmi_uptrend_has_positive_bias() {
        let high = committed(&[dec!(10), dec!(11), dec!(12), dec!(13), dec!(14)]);
        let low = committed(&[dec!(9), dec!(10), dec!(11), dec!(12), dec!(13)]);
        let close = committed(&[dec!(9.5), dec!(10.5), dec!(11.5), dec!(12.5), dec!(13.5)]);
        let (plus_di, minus_di, adx) = dmi(&high, &low, &close, 3, 3);
        assert!(plus_di > minus_di);
        assert_eq!(minus_di, Decimal::ZERO);
        assert_eq!(adx, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_dmi_warmup() {
        let series = committed(&[dec!(1), dec!(2)]);
        assert_eq!(
            dmi(&series, &series, &series, 14, 14),
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        );
    }

    #[test]
    fn test_supertrend_direction_follows_close() {
        let high = committed(&[dec!(11), dec!(12), dec!(13)]);
        let low = committed(&[dec!(9), dec!(10), dec!(11)]);
        let bullish_close = committed(&[dec!(10), dec!(11), dec!(12.5)]);
        let (_, direction) = supertrend(&high, &low, &bullish_close, dec!(3), 3);
        assert_eq!(direction, 1);

        let bearish_close = committed(&[dec!(10), dec!(11), dec!(11.5)]);
        let (_, direction) = supertrend(&high, &low, &bearish_close, dec!(3), 3);
        assert_eq!(direction, -1);
    }

    #[test]
    fn test_sar_uptrend_vector() {
        let high = committed(&[dec!(10), dec!(11), dec!(12), dec!(13)]);
        let low = committed(&[dec!(9), dec!(10), dec!(11), dec!(12)]);
        // Long from bar 0: stop 9, extreme ratchets 10 -> 11 -> 12 -> 13 with
        // the acceleration stepping 0.02 -> 0.04 -> 0.06 -> 0.08.
        assert_eq!(
            sar(&high, &low, dec!(0.02), dec!(0.02), dec!(0.2)),
            dec!(9.273248)
        );
    }

    #[test]
    fn test_sar_flips_on_penetration() {
        let high = committed(&[dec!(10), dec!(11), dec!(8)]);
        let low = committed(&[dec!(9), dec!(10), dec!(7)]);
        // The gap below the stop reverses the trend; the new stop starts at
        // the prior extreme point.
        assert_eq!(
            sar(&high, &low, dec!(0.02), dec!(0.02), dec!(0.2)),
            dec!(11)
        );
    }

    #[test]
    fn test_sar_insufficient_history() {
        let high = committed(&[dec!(10)]);
        let low = committed(&[dec!(9)]);
        assert_eq!(sar(&high, &low, dec!(0.02), dec!(0.02), dec!(0.2)), dec!(9));
    }
}
