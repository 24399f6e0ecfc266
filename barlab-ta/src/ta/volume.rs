//! Volume studies.

use crate::series::{Series, nz};
use rust_decimal::Decimal;

/// On-Balance Volume: cumulative signed volume over the reachable window,
/// adding volume on up-closes and subtracting it on down-closes.
pub fn obv(close: &Series<Decimal>, volume: &Series<Decimal>) -> Decimal {
    let (closes, volumes) = paired_window(close, volume);

    let mut result = Decimal::ZERO;
    for k in 1..closes.len() {
        if closes[k] > closes[k - 1] {
            result += volumes[k];
        } else if closes[k] < closes[k - 1] {
            result -= volumes[k];
        }
    }
    result
}

/// Volume-Weighted Average Price over the reachable window:
/// `cum(typical_price * volume) / cum(volume)`.
pub fn vwap(
    high: &Series<Decimal>,
    low: &Series<Decimal>,
    close: &Series<Decimal>,
    volume: &Series<Decimal>,
) -> Decimal {
    let three = Decimal::from(3);
    let mut weighted_sum = Decimal::ZERO;
    let mut volume_sum = Decimal::ZERO;

    let mut offset = 0i64;
    loop {
        let (Ok(h), Ok(l), Ok(c), Ok(v)) = (
            high.get(offset),
            low.get(offset),
            close.get(offset),
            volume.get(offset),
        ) else {
            break;
        };
        let typical = (nz(h) + nz(l) + nz(c)) / three;
        weighted_sum += typical * nz(v);
        volume_sum += nz(v);
        offset += 1;
    }

    if volume_sum.is_zero() {
        return Decimal::ZERO;
    }
    weighted_sum / volume_sum
}

/// Cumulative sum of the series, including the staged current value.
pub fn cum(source: &Series<Decimal>) -> Decimal {
    let mut total = nz(source.current().ok().flatten());
    for i in 1..=source.len() as i64 {
        match source.get(i) {
            Ok(v) => total += nz(v),
            Err(_) => break,
        }
    }
    total
}

/// Collect the contiguous window both series can serve, oldest first.
fn paired_window(
    a: &Series<Decimal>,
    b: &Series<Decimal>,
) -> (Vec<Decimal>, Vec<Decimal>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut offset = 0i64;
    while let (Ok(x), Ok(y)) = (a.get(offset), b.get(offset)) {
        left.push(nz(x));
        right.push(nz(y));
        offset += 1;
    }
    left.reverse();
    right.reverse();
    (left, right)
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
    fn test_obv_signs_volume_by_close_direction() {
        let close = committed(&[dec!(10), dec!(11), dec!(10.5), dec!(12)]);
        let volume = committed(&[dec!(100), dec!(200), dec!(150), dec!(300)]);
        // +200 (up) - 150 (down) + 300 (up)
        assert_eq!(obv(&close, &volume), dec!(350));
    }

    #[test]
    fn test_obv_flat_close_ignores_volume() {
        let close = committed(&[dec!(10), dec!(10), dec!(10)]);
        let volume = committed(&[dec!(100), dec!(200), dec!(300)]);
        assert_eq!(obv(&close, &volume), Decimal::ZERO);
    }

    #[test]
    fn test_obv_counts_staged_bar_once() {
        let close = committed(&[dec!(10), dec!(11)]);
        let volume = committed(&[dec!(100), dec!(200)]);
        let before = obv(&close, &volume);

        let mut close = close;
        let mut volume = volume;
        close.set_current(dec!(12));
        volume.set_current(dec!(50));
        assert_eq!(obv(&close, &volume), before + dec!(50));
    }

    #[test]
    fn test_vwap_weights_by_volume() {
        let high = committed(&[dec!(12), dec!(22)]);
        let low = committed(&[dec!(8), dec!(18)]);
        let close = committed(&[dec!(10), dec!(20)]);
        let volume = committed(&[dec!(100), dec!(300)]);
        // Typical prices 10 and 20, volumes 100 and 300.
        assert_eq!(vwap(&high, &low, &close, &volume), dec!(17.5));
    }

    #[test]
    fn test_vwap_zero_volume() {
        let series = committed(&[dec!(10), dec!(20)]);
        let volume = committed(&[dec!(0), dec!(0)]);
        assert_eq!(vwap(&series, &series, &series, &volume), Decimal::ZERO);
    }

    #[test]
    fn test_cum_includes_staged_current() {
        let mut series = committed(&[dec!(1), dec!(2), dec!(3)]);
        assert_eq!(cum(&series), dec!(6));
        series.set_current(dec!(4));
        assert_eq!(cum(&series), dec!(10));
    }
}
