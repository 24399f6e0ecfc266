use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors produced by [`Series`] history access.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum SeriesError {
    #[error("series '{name}': negative index {index}")]
    NegativeIndex { name: SmolStr, index: i64 },

    #[error(
        "series '{name}': index {index} requires at least {required} bars, \
         but only {available} available"
    )]
    InsufficientData {
        name: SmolStr,
        index: i64,
        required: usize,
        available: usize,
    },

    #[error("series '{name}': no current value set and no history")]
    Empty { name: SmolStr },
}

/// Rolling, bar-indexed history container with a transactional commit protocol.
///
/// A `Series` holds up to `max_bars_back` committed values plus one staged
/// "current" value. Index `0` denotes the current bar: while a value is
/// staged, `get(0)` returns it and historical offsets shift by one; once the
/// bar is committed the staged value becomes history.
///
/// Absent values are represented as `None` - the single sentinel every
/// consumer observes via [`na`] and replaces via [`nz`].
///
/// ```
/// use barlab_ta::series::Series;
/// use rust_decimal::Decimal;
///
/// let mut close = Series::new("close", 100);
/// close.set_current(Decimal::from(100));
/// close.commit();
/// close.set_current(Decimal::from(101));
///
/// assert_eq!(close.get(0).unwrap(), Some(Decimal::from(101)));
/// assert_eq!(close.get(1).unwrap(), Some(Decimal::from(100)));
/// ```
#[derive(Debug, Clone)]
pub struct Series<T> {
    name: SmolStr,
    max_bars_back: usize,
    /// Committed history, newest value at the front.
    buffer: VecDeque<Option<T>>,
    staged: Option<T>,
}

impl<T: Clone> Series<T> {
    pub fn new(name: impl Into<SmolStr>, max_bars_back: usize) -> Self {
        Self {
            name: name.into(),
            max_bars_back: max_bars_back.max(1),
            buffer: VecDeque::new(),
            staged: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_bars_back(&self) -> usize {
        self.max_bars_back
    }

    /// Number of committed values.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.staged.is_none()
    }

    /// Stage the current bar's value.
    pub fn set_current(&mut self, value: T) {
        self.staged = Some(value);
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// The staged value if one exists, otherwise the most recent committed
    /// value. Fails only when the series holds no data at all.
    pub fn current(&self) -> Result<Option<T>, SeriesError> {
        if let Some(staged) = &self.staged {
            return Ok(Some(staged.clone()));
        }
        self.buffer
            .front()
            .cloned()
            .ok_or_else(|| SeriesError::Empty {
                name: self.name.clone(),
            })
    }

    /// Promote the staged value into history and clear the stage.
    ///
    /// If nothing was staged this bar, the most recent committed value is
    /// carried forward, or absent is recorded when the buffer is empty.
    pub fn commit(&mut self) {
        let value = match self.staged.take() {
            Some(value) => Some(value),
            None => self.buffer.front().cloned().flatten(),
        };
        self.buffer.push_front(value);
        self.buffer.truncate(self.max_bars_back);
    }

    /// Discard the staged value.
    pub fn rollback(&mut self) {
        self.staged = None;
    }

    /// Access a historical value. Index `0` is the current bar; `i > 0` is
    /// `i` bars back relative to it.
    pub fn get(&self, index: i64) -> Result<Option<T>, SeriesError> {
        if index == 0 && self.staged.is_some() {
            return Ok(self.staged.clone());
        }

        // While a value is staged it occupies index 0, so history shifts.
        let buf_index = if self.staged.is_some() && index > 0 {
            index - 1
        } else {
            index
        };

        if buf_index < 0 {
            return Err(SeriesError::NegativeIndex {
                name: self.name.clone(),
                index,
            });
        }

        let buf_index = buf_index as usize;
        self.buffer
            .get(buf_index)
            .cloned()
            .ok_or_else(|| SeriesError::InsufficientData {
                name: self.name.clone(),
                index,
                required: buf_index + 1,
                available: self.buffer.len(),
            })
    }

    /// Snapshot of `[start, stop)`, newest to oldest.
    pub fn get_range(&self, start: i64, stop: i64) -> Result<Vec<Option<T>>, SeriesError> {
        (start..stop).map(|index| self.get(index)).collect()
    }
}

/// True when a value is absent.
pub fn na<T>(value: &Option<T>) -> bool {
    value.is_none()
}

/// Replace absent with zero.
pub fn nz(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

/// Replace absent with the provided replacement.
pub fn nz_or(value: Option<Decimal>, replacement: Decimal) -> Decimal {
    value.unwrap_or(replacement)
}

/// The most recent non-absent value of the series, or zero if every
/// reachable value is absent.
pub fn fix_na(series: &Series<Decimal>) -> Decimal {
    let reachable = series.len() + usize::from(series.has_staged());
    for index in 0..reachable as i64 {
        if let Ok(Some(value)) = series.get(index) {
            return value;
        }
    }
    Decimal::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn committed(values: &[Decimal]) -> Series<Decimal> {
        let mut series = Series::new("test", 500);
        for value in values {
            series.set_current(*value);
            series.commit();
        }
        series
    }

    #[test]
    fn test_round_trip_ordering() {
        let series = committed(&[dec!(1), dec!(2), dec!(3), dec!(4)]);

        assert_eq!(series.len(), 4);
        assert_eq!(series.get(0).unwrap(), Some(dec!(4)));
        assert_eq!(series.get(1).unwrap(), Some(dec!(3)));
        assert_eq!(series.get(3).unwrap(), Some(dec!(1)));
    }

    #[test]
    fn test_staged_value_shifts_history() {
        let mut series = committed(&[dec!(100), dec!(101)]);
        series.set_current(dec!(102));

        assert_eq!(series.get(0).unwrap(), Some(dec!(102)));
        assert_eq!(series.get(1).unwrap(), Some(dec!(101)));
        assert_eq!(series.get(2).unwrap(), Some(dec!(100)));
        // Committed length is unchanged until commit.
        assert_eq!(series.len(), 2);

        series.commit();
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(0).unwrap(), Some(dec!(102)));
    }

    #[test]
    fn test_rollback_discards_stage() {
        let mut series = committed(&[dec!(10)]);
        series.set_current(dec!(11));
        series.rollback();

        assert_eq!(series.get(0).unwrap(), Some(dec!(10)));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_commit_without_stage_carries_forward() {
        let mut series = committed(&[dec!(7)]);
        series.commit();

        assert_eq!(series.len(), 2);
        assert_eq!(series.get(0).unwrap(), Some(dec!(7)));
        assert_eq!(series.get(1).unwrap(), Some(dec!(7)));
    }

    #[test]
    fn test_commit_on_empty_records_absent() {
        let mut series: Series<Decimal> = Series::new("empty", 10);
        series.commit();

        assert_eq!(series.len(), 1);
        assert_eq!(series.get(0).unwrap(), None);
    }

    #[test]
    fn test_buffer_bounded_by_max_bars_back() {
        let mut series = Series::new("bounded", 3);
        for i in 1..=5 {
            series.set_current(Decimal::from(i));
            series.commit();
        }

        assert_eq!(series.len(), 3);
        assert_eq!(series.get(0).unwrap(), Some(dec!(5)));
        assert_eq!(series.get(2).unwrap(), Some(dec!(3)));
        assert!(matches!(
            series.get(3),
            Err(SeriesError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_negative_index_rejected() {
        let series = committed(&[dec!(1)]);
        assert!(matches!(
            series.get(-1),
            Err(SeriesError::NegativeIndex { index: -1, .. })
        ));
    }

    #[test]
    fn test_current_on_empty_fails() {
        let series: Series<Decimal> = Series::new("empty", 10);
        assert!(matches!(series.current(), Err(SeriesError::Empty { .. })));
    }

    #[test]
    fn test_get_range_newest_to_oldest() {
        let series = committed(&[dec!(1), dec!(2), dec!(3)]);
        let snapshot = series.get_range(0, 3).unwrap();
        assert_eq!(
            snapshot,
            vec![Some(dec!(3)), Some(dec!(2)), Some(dec!(1))]
        );
    }

    #[test]
    fn test_na_nz_helpers() {
        assert!(na::<Decimal>(&None));
        assert!(!na(&Some(dec!(1))));
        assert_eq!(nz(None), Decimal::ZERO);
        assert_eq!(nz(Some(dec!(2.5))), dec!(2.5));
        assert_eq!(nz_or(None, dec!(50)), dec!(50));
    }

    #[test]
    fn test_fix_na_finds_most_recent_value() {
        let mut gappy: Series<Decimal> = Series::new("gappy", 10);
        // An absent bar followed by real data.
        gappy.commit();
        gappy.set_current(dec!(9));
        gappy.commit();
        gappy.commit();
        assert_eq!(fix_na(&gappy), dec!(9));

        let empty: Series<Decimal> = Series::new("none", 10);
        assert_eq!(fix_na(&empty), Decimal::ZERO);
    }
}
