//! Series crossing predicates.

use crate::series::{Series, nz};
use rust_decimal::Decimal;

/// True when `a` crosses above `b`: `a[0] > b[0]` and `a[1] <= b[1]`.
pub fn crossover(a: &Series<Decimal>, b: &Series<Decimal>) -> bool {
    if a.len() < 1 || b.len() < 1 {
        return false;
    }
    let (Ok(curr_a), Ok(curr_b), Ok(prev_a), Ok(prev_b)) =
        (a.current(), b.current(), a.get(1), b.get(1))
    else {
        return false;
    };
    nz(curr_a) > nz(curr_b) && nz(prev_a) <= nz(prev_b)
}

/// True when `a` crosses below `b`: `a[0] < b[0]` and `a[1] >= b[1]`.
pub fn crossunder(a: &Series<Decimal>, b: &Series<Decimal>) -> bool {
    if a.len() < 1 || b.len() < 1 {
        return false;
    }
    let (Ok(curr_a), Ok(curr_b), Ok(prev_a), Ok(prev_b)) =
        (a.current(), b.current(), a.get(1), b.get(1))
    else {
        return false;
    };
    nz(curr_a) < nz(curr_b) && nz(prev_a) >= nz(prev_b)
}

/// True when the series cross in either direction.
pub fn cross(a: &Series<Decimal>, b: &Series<Decimal>) -> bool {
    crossover(a, b) || crossunder(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn two_bar(prev: Decimal, curr: Decimal) -> Series<Decimal> {
        let mut series = Series::new("src", 10);
        series.set_current(prev);
        series.commit();
        series.set_current(curr);
        series.commit();
        series
    }

    #[test]
    fn test_crossover_detection() {
        let fast = two_bar(dec!(10), dec!(15));
        let slow = two_bar(dec!(12), dec!(12));
        assert!(crossover(&fast, &slow));
        assert!(!crossunder(&fast, &slow));
        assert!(cross(&fast, &slow));
    }

    #[test]
    fn test_crossunder_detection() {
        let fast = two_bar(dec!(14), dec!(9));
        let slow = two_bar(dec!(12), dec!(12));
        assert!(crossunder(&fast, &slow));
        assert!(!crossover(&fast, &slow));
    }

    #[test]
    fn test_no_cross_when_already_above() {
        let fast = two_bar(dec!(13), dec!(15));
        let slow = two_bar(dec!(12), dec!(12));
        assert!(!crossover(&fast, &slow));
        assert!(!crossunder(&fast, &slow));
    }

    #[test]
    fn test_touch_then_break_counts() {
        // Equality on the previous bar still arms the crossover.
        let fast = two_bar(dec!(12), dec!(13));
        let slow = two_bar(dec!(12), dec!(12));
        assert!(crossover(&fast, &slow));
    }

    #[test]
    fn test_crossover_and_crossunder_never_both() {
        let cases = [
            (dec!(10), dec!(15), dec!(12), dec!(12)),
            (dec!(14), dec!(9), dec!(12), dec!(12)),
            (dec!(12), dec!(12), dec!(12), dec!(12)),
            (dec!(1), dec!(2), dec!(3), dec!(4)),
        ];
        for (index, (fast_prev, fast_curr, slow_prev, slow_curr)) in
            cases.into_iter().enumerate()
        {
            let fast = two_bar(fast_prev, fast_curr);
            let slow = two_bar(slow_prev, slow_curr);
            assert!(
                !(crossover(&fast, &slow) && crossunder(&fast, &slow)),
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_insufficient_history_is_false() {
        let mut fast = Series::new("fast", 10);
        fast.set_current(dec!(15));
        let mut slow = Series::new("slow", 10);
        slow.set_current(dec!(12));
        assert!(!crossover(&fast, &slow));
        assert!(!cross(&fast, &slow));
    }
}
