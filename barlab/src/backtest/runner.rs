use crate::backtest::config::BacktestConfig;
use crate::backtest::result::BacktestResult;
use crate::data::feed::DataFeed;
use crate::engine::EventLoop;
use crate::error::BarlabError;
use crate::statistic::summary::MetricsSummary;
use crate::strategy::Strategy;
use crate::strategy::parameters::Parameters;
use itertools::Itertools;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tracing::info;

/// Top-level orchestrator: composes a feed, a configuration and a strategy,
/// drives the event loop and aggregates metrics into a [`BacktestResult`].
#[derive(Debug)]
pub struct BacktestRunner<'a, F: DataFeed> {
    feed: &'a F,
    config: BacktestConfig,
}

impl<'a, F: DataFeed> BacktestRunner<'a, F> {
    /// Fails fast on an invalid configuration.
    pub fn new(feed: &'a F, config: BacktestConfig) -> Result<Self, BarlabError> {
        config.validate()?;
        Ok(Self { feed, config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn run<S: Strategy + ?Sized>(
        &self,
        strategy: &mut S,
    ) -> Result<BacktestResult, BarlabError> {
        let parameters = strategy.parameters();
        let run_hash = compute_run_hash(
            strategy.name(),
            &parameters,
            &self.config.symbol_info.ticker,
            self.config.timeframe.as_str(),
            self.config.initial_capital,
            self.feed.len(),
        );

        info!(
            strategy = strategy.name(),
            symbol = self.feed.symbol(),
            run_hash,
            "backtest start"
        );

        let mut event_loop = EventLoop::new(
            self.config.symbol_info.clone(),
            self.config.timeframe,
            self.config.initial_capital,
            self.config.commission.clone(),
            self.config.slippage,
            self.config.max_bars_back,
        );
        if let Some(limits) = &self.config.risk_limits {
            event_loop = event_loop.with_risk_limits(limits.clone());
        }

        event_loop.run(strategy, self.feed)?;

        let final_equity = self
            .feed
            .bars()
            .last()
            .map(|bar| event_loop.portfolio().equity(bar.close))
            .unwrap_or(Decimal::ZERO);

        let trades = event_loop.portfolio().trade_results().to_vec();
        let equity_curve = event_loop.portfolio().equity_curve().to_vec();
        let metrics =
            MetricsSummary::compute(&trades, &equity_curve, self.config.initial_capital);

        info!(
            strategy = strategy.name(),
            final_equity = %final_equity,
            total_trades = trades.len(),
            "backtest complete"
        );

        Ok(BacktestResult {
            run_hash,
            strategy_name: strategy.name().into(),
            parameters,
            config: self.config.clone(),
            trades,
            equity_curve,
            final_equity,
            total_bars: self.feed.len(),
            metrics,
        })
    }
}

/// Deterministic fingerprint of the backtest inputs: SHA-256 over the
/// canonical join of strategy name, parameter map (sorted by key,
/// string-rendered), ticker, timeframe tag, initial capital and bar count.
pub fn compute_run_hash(
    strategy_name: &str,
    parameters: &Parameters,
    ticker: &str,
    timeframe: &str,
    initial_capital: Decimal,
    total_bars: usize,
) -> String {
    let rendered_params = parameters
        .iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(name, value)| format!("{name}={value}"))
        .join(",");

    let raw = [
        strategy_name,
        &rendered_params,
        ticker,
        timeframe,
        &initial_capital.to_string(),
        &total_bars.to_string(),
    ]
    .join("|");

    hex::encode(Sha256::digest(raw.as_bytes()))
}
