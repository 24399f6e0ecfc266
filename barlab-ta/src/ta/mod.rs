//! Technical analysis functions over [`Series`](crate::series::Series).
//!
//! Every function computes a scalar (or small tuple) against the current
//! staged bar and is referentially transparent given identical series
//! snapshots. Warmup policy: before enough bars exist, functions return
//! their documented neutral value (`0` for most, `50` for RSI/MFI, absent
//! for pivots) and never error. Division by zero yields zero throughout.

pub mod cross;
pub mod ma;
pub mod oscillator;
pub mod pivot;
pub mod stat;
pub mod trend;
pub mod util;
pub mod volume;

pub use cross::{cross, crossover, crossunder};
pub use ma::{ema, hma, rma, sma, smma, vwma, wma};
pub use oscillator::{cci, mfi, mom, roc, rsi, stoch, wpr};
pub use pivot::{pivothigh, pivotlow};
pub use stat::{
    change, correlation, highest, highestbars, linreg, lowest, lowestbars, median, stdev, variance,
};
pub use trend::{atr, bb, bbw, dmi, kc, kcw, macd, sar, supertrend, tr};
pub use util::{barssince, falling, rising, valuewhen};
pub use volume::{cum, obv, vwap};

use crate::series::{Series, SeriesError};
use rust_decimal::Decimal;

/// Historical value at a bar offset, shared shorthand for the indicator
/// implementations.
pub(crate) fn value(
    source: &Series<Decimal>,
    index: usize,
) -> Result<Option<Decimal>, SeriesError> {
    source.get(index as i64)
}
