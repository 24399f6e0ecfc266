#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Barlab
//! Barlab is a deterministic, event-driven **bar-by-bar backtesting engine**
//! for algorithmic trading strategies, with a companion parameter optimizer.
//! Strategies consume historical OHLCV bars and emit orders; the engine
//! simulates realistic execution (next-bar fills, commission, slippage),
//! tracks positions and equity, and produces a reproducible run hash plus
//! performance metrics.
//!
//! At a high level it provides several de-coupled components:
//! * **Data**: the [`data::DataFeed`] trait yields bars in ascending
//!   timestamp order; [`data::InMemoryFeed`] backs tests and CSV loads.
//! * **Engine**: the [`engine::EventLoop`] advances one bar at a time with a
//!   strict no-look-ahead pipeline; the [`engine::BarContext`] holds the
//!   built-in OHLCV series and every user series, committed or rolled back
//!   as one batch per bar.
//! * **Execution**: the [`execution::SimulatedBroker`] matches PENDING
//!   orders against the next bar's range under MARKET/LIMIT/STOP/STOP-LIMIT
//!   semantics, applying the configured [`execution::Commission`] and
//!   [`execution::Slippage`] models.
//! * **Portfolio**: tracks cash, tagged positions, the equity curve and the
//!   flattened trade record produced whenever a position closes.
//! * **Strategy**: the [`strategy::Strategy`] trait (`on_init` / `on_bar`)
//!   plus declarative parameter descriptors that double as the optimizer's
//!   search space.
//! * **Statistic**: Sharpe, Sortino, Calmar, drawdown episodes, trade stats
//!   computed in fixed precision from trades and the equity curve.
//! * **Optimize**: grid and evolutionary search over the declared parameter
//!   space, with deterministic trial ordering and an optional worker pool.
//!
//! All numerics are [`rust_decimal::Decimal`]; two runs with identical
//! inputs produce identical hashes, trades and equity curves.

pub mod backtest;
pub mod data;
pub mod engine;
pub mod error;
pub mod execution;
pub mod logging;
pub mod optimize;
pub mod portfolio;
pub mod statistic;
pub mod strategy;

pub use error::BarlabError;
