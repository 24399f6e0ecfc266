//! Performance metrics computed in fixed precision from trades and the
//! equity curve.

pub mod dispersion;
pub mod drawdown;
pub mod summary;

pub use drawdown::DrawdownEpisode;
pub use summary::MetricsSummary;
