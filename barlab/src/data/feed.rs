use crate::data::error::DataError;
use crate::data::market::{Bar, Timeframe};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::path::Path;
use std::str::FromStr;

/// A source of bars in strict ascending timestamp order.
///
/// The engine does not prescribe the backing store; anything that can
/// surface a sorted slice of [`Bar`]s can drive a backtest.
pub trait DataFeed {
    fn symbol(&self) -> &str;

    fn timeframe(&self) -> Timeframe;

    /// Bars in ascending timestamp order.
    fn bars(&self) -> &[Bar];

    fn len(&self) -> usize {
        self.bars().len()
    }

    fn is_empty(&self) -> bool {
        self.bars().is_empty()
    }
}

/// Bar source backed by a pre-loaded, validated vector.
#[derive(Debug, Clone)]
pub struct InMemoryFeed {
    symbol: SmolStr,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl InMemoryFeed {
    /// Sorts the bars ascending and rejects duplicate timestamps.
    pub fn new(
        symbol: impl Into<SmolStr>,
        timeframe: Timeframe,
        mut bars: Vec<Bar>,
    ) -> Result<Self, DataError> {
        let symbol = symbol.into();
        bars.sort_by_key(|bar| bar.timestamp);

        for window in bars.windows(2) {
            if window[0].timestamp == window[1].timestamp {
                return Err(DataError::DuplicateTimestamp {
                    symbol: symbol.to_string(),
                    timestamp: window[0].timestamp,
                });
            }
        }

        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    /// Load bars from a CSV file with the header
    /// `timestamp,open,high,low,close,volume` and timestamps formatted as
    /// `%Y-%m-%d %H:%M:%S` (interpreted as UTC).
    pub fn from_csv(
        path: impl AsRef<Path>,
        symbol: impl Into<SmolStr>,
        timeframe: Timeframe,
    ) -> Result<Self, DataError> {
        let contents = std::fs::read_to_string(path)?;
        let mut bars = Vec::new();

        for (line_number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || (line_number == 0 && line.starts_with("timestamp")) {
                continue;
            }

            let parse = |message: String| DataError::Csv {
                line: line_number + 1,
                message,
            };

            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < 6 {
                return Err(parse(format!("expected 6 fields, found {}", fields.len())));
            }

            let timestamp = NaiveDateTime::parse_from_str(fields[0], "%Y-%m-%d %H:%M:%S")
                .map_err(|e| parse(format!("bad timestamp '{}': {e}", fields[0])))?
                .and_utc();
            let decimal = |field: &str| {
                Decimal::from_str(field.trim())
                    .map_err(|e| parse(format!("bad decimal '{field}': {e}")))
            };

            bars.push(Bar {
                timestamp,
                open: decimal(fields[1])?,
                high: decimal(fields[2])?,
                low: decimal(fields[3])?,
                close: decimal(fields[4])?,
                volume: decimal(fields[5])?,
            });
        }

        Self::new(symbol, timeframe, bars)
    }
}

impl DataFeed for InMemoryFeed {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    fn bars(&self) -> &[Bar] {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bar_at(minute: u32, close: Decimal) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(100),
        }
    }

    #[test]
    fn test_bars_sorted_ascending() {
        let feed = InMemoryFeed::new(
            "BTC-USD",
            Timeframe::M1,
            vec![bar_at(2, dec!(3)), bar_at(0, dec!(1)), bar_at(1, dec!(2))],
        )
        .unwrap();

        let closes: Vec<Decimal> = feed.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![dec!(1), dec!(2), dec!(3)]);
        assert_eq!(feed.len(), 3);
    }

    #[test]
    fn test_duplicate_timestamps_rejected() {
        let result = InMemoryFeed::new(
            "BTC-USD",
            Timeframe::M1,
            vec![bar_at(0, dec!(1)), bar_at(0, dec!(2))],
        );
        assert!(matches!(
            result,
            Err(DataError::DuplicateTimestamp { .. })
        ));
    }
}
