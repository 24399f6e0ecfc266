//! Windowed extrema and statistics.

use super::ma::sma;
use super::value;
use crate::math;
use crate::series::{Series, nz};
use rust_decimal::Decimal;

/// Highest value over the last `length` bars.
pub fn highest(source: &Series<Decimal>, length: usize) -> Decimal {
    let Ok(current) = source.current() else {
        return Decimal::ZERO;
    };
    let mut result = nz(current);
    for i in 1..length {
        match value(source, i) {
            Ok(Some(v)) if v > result => result = v,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    result
}

/// Lowest value over the last `length` bars.
pub fn lowest(source: &Series<Decimal>, length: usize) -> Decimal {
    let Ok(current) = source.current() else {
        return Decimal::ZERO;
    };
    let mut result = nz(current);
    for i in 1..length {
        match value(source, i) {
            Ok(Some(v)) if v < result => result = v,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    result
}

/// Offset to the highest value over the last `length` bars, as a
/// non-positive bar offset (`0` = current bar, `-1` = one bar ago).
pub fn highestbars(source: &Series<Decimal>, length: usize) -> i64 {
    let mut best_value = nz(source.current().ok().flatten());
    let mut best_offset = 0i64;
    for i in 1..length {
        match value(source, i) {
            Ok(Some(v)) if v > best_value => {
                best_value = v;
                best_offset = i as i64;
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    -best_offset
}

/// Offset to the lowest value over the last `length` bars, as a
/// non-positive bar offset.
pub fn lowestbars(source: &Series<Decimal>, length: usize) -> i64 {
    let mut best_value = nz(source.current().ok().flatten());
    let mut best_offset = 0i64;
    for i in 1..length {
        match value(source, i) {
            Ok(Some(v)) if v < best_value => {
                best_value = v;
                best_offset = i as i64;
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    -best_offset
}

/// Population standard deviation over the last `length` bars.
pub fn stdev(source: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 {
        return Decimal::ZERO;
    }

    let mean = sma(source, length);
    if mean.is_zero() && source.len() < length {
        return Decimal::ZERO;
    }

    let mut sum_sq = Decimal::ZERO;
    let mut count: u64 = 0;
    for i in 0..length {
        match value(source, i) {
            Ok(v) => {
                let diff = nz(v) - mean;
                sum_sq += diff * diff;
                count += 1;
            }
            Err(_) => break,
        }
    }

    if count <= 1 {
        return Decimal::ZERO;
    }
    math::sqrt(sum_sq / Decimal::from(count))
}

/// Population variance over the last `length` bars.
pub fn variance(source: &Series<Decimal>, length: usize) -> Decimal {
    let sd = stdev(source, length);
    sd * sd
}

/// Median of the last `length` bars.
pub fn median(source: &Series<Decimal>, length: usize) -> Decimal {
    if length == 0 || source.len() + 1 < length {
        return Decimal::ZERO;
    }

    let mut values = Vec::with_capacity(length);
    for i in 0..length {
        match value(source, i) {
            Ok(v) => values.push(nz(v)),
            Err(_) => break,
        }
    }

    if values.is_empty() {
        return Decimal::ZERO;
    }

    values.sort();
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / Decimal::TWO
    }
}

/// Pearson correlation coefficient between two series over a window.
pub fn correlation(
    source_a: &Series<Decimal>,
    source_b: &Series<Decimal>,
    length: usize,
) -> Decimal {
    if length == 0 || source_a.len() + 1 < length || source_b.len() + 1 < length {
        return Decimal::ZERO;
    }

    let n = Decimal::from(length as u64);
    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_x2 = Decimal::ZERO;
    let mut sum_y2 = Decimal::ZERO;

    for i in 0..length {
        let (Ok(x), Ok(y)) = (value(source_a, i), value(source_b, i)) else {
            return Decimal::ZERO;
        };
        let x = nz(x);
        let y = nz(y);
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator_sq = (n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y);
    if denominator_sq <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    math::safe_div(numerator, math::sqrt(denominator_sq))
}

/// Least-squares linear regression evaluated at the most recent point minus
/// `offset`.
pub fn linreg(source: &Series<Decimal>, length: usize, offset: usize) -> Decimal {
    if length == 0 || source.len() + 1 < length {
        return Decimal::ZERO;
    }

    let n = Decimal::from(length as u64);
    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_x2 = Decimal::ZERO;

    for i in 0..length {
        // x runs oldest (0) to newest (length - 1).
        let x = Decimal::from((length - 1 - i) as u64);
        let Ok(y) = value(source, i) else {
            return Decimal::ZERO;
        };
        let y = nz(y);
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.is_zero() {
        return sum_y / n;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let eval_x = Decimal::from((length - 1).saturating_sub(offset) as u64);
    slope * eval_x + intercept
}

/// Difference between the current value and the value `length` bars ago.
pub fn change(source: &Series<Decimal>, length: usize) -> Decimal {
    match (source.current(), value(source, length)) {
        (Ok(Some(current)), Ok(Some(previous))) => current - previous,
        _ => Decimal::ZERO,
    }
}
