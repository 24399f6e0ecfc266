use crate::data::error::DataError;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::str::FromStr;

/// Single OHLCV bar. Prices and volume are fixed-precision decimals so the
/// whole simulation stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Deserialize, Serialize, Constructor)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Immutable symbol metadata attached to a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SymbolInfo {
    pub ticker: SmolStr,
    pub exchange: SmolStr,
    pub asset_type: SmolStr,
    pub tick_size: Decimal,
    pub lot_size: Decimal,
    pub base_currency: SmolStr,
    pub quote_currency: SmolStr,
}

impl SymbolInfo {
    /// Symbol metadata with conventional defaults for everything except the
    /// ticker.
    pub fn new(ticker: impl Into<SmolStr>) -> Self {
        Self {
            ticker: ticker.into(),
            exchange: SmolStr::default(),
            asset_type: SmolStr::new_static("crypto"),
            tick_size: Decimal::new(1, 2),
            lot_size: Decimal::new(1, 3),
            base_currency: SmolStr::new_static("USD"),
            quote_currency: SmolStr::new_static("USD"),
        }
    }
}

/// Supported bar intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
    Mn1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1D",
            Self::W1 => "1W",
            Self::Mn1 => "1M",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::M1),
            "5m" => Ok(Self::M5),
            "15m" => Ok(Self::M15),
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            "4h" => Ok(Self::H4),
            "1D" => Ok(Self::D1),
            "1W" => Ok(Self::W1),
            "1M" => Ok(Self::Mn1),
            other => Err(DataError::UnknownTimeframe(other.to_string())),
        }
    }
}

/// Processing state of the bar currently held by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum BarState {
    /// Bar data staged, strategy not yet run.
    New,
    /// Every registered series committed for this bar.
    Confirmed,
}
