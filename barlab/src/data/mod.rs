//! Market data types and bar sources.

pub mod error;
pub mod feed;
pub mod market;

pub use error::DataError;
pub use feed::{DataFeed, InMemoryFeed};
pub use market::{Bar, BarState, SymbolInfo, Timeframe};
