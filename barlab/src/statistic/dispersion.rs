use barlab_ta::math;
use rust_decimal::Decimal;

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len() as u64)
}

/// Population variance; zero for fewer than two values.
pub fn variance(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let mu = mean(values);
    values
        .iter()
        .map(|v| (v - mu) * (v - mu))
        .sum::<Decimal>()
        / Decimal::from(values.len() as u64)
}

/// Population standard deviation.
pub fn std_dev(values: &[Decimal]) -> Decimal {
    math::sqrt(variance(values))
}
