//! The per-bar simulation pipeline.

pub mod context;

pub use context::{BarContext, FlagId, SeriesId};

use crate::data::feed::DataFeed;
use crate::data::market::{Bar, SymbolInfo, Timeframe};
use crate::error::BarlabError;
use crate::execution::broker::SimulatedBroker;
use crate::execution::commission::Commission;
use crate::execution::order::{Order, OrderAction, OrderId};
use crate::execution::risk::RiskLimits;
use crate::execution::slippage::Slippage;
use crate::portfolio::portfolio::Portfolio;
use crate::strategy::{Strategy, TradeContext};
use fnv::FnvHashMap;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

/// Bar-by-bar simulation loop coordinating context, broker, portfolio and
/// strategy.
///
/// Per-bar pipeline:
/// 1. commit the previous bar's series,
/// 2. stage the new bar's OHLCV into the context,
/// 3. match pending orders from prior bars and apply the fills,
/// 4. run the strategy (a failure rolls the bar back and aborts),
/// 5. forward the strategy's queued orders to the broker,
/// 6. record equity at the bar close.
///
/// Orders queued on bar `n` are first eligible to fill on bar `n + 1`, and
/// the strategy reads its own series updates as "current" within the bar.
#[derive(Debug)]
pub struct EventLoop {
    context: BarContext,
    broker: SimulatedBroker,
    portfolio: Portfolio,
    queue: Vec<(Order, OrderAction)>,
    actions: FnvHashMap<OrderId, OrderAction>,
    next_order_id: u64,
    risk_limits: Option<RiskLimits>,
}

impl EventLoop {
    pub fn new(
        symbol_info: SymbolInfo,
        timeframe: Timeframe,
        initial_capital: Decimal,
        commission: Commission,
        slippage: Slippage,
        max_bars_back: usize,
    ) -> Self {
        Self {
            context: BarContext::new(symbol_info, timeframe, max_bars_back),
            broker: SimulatedBroker::new(commission, slippage),
            portfolio: Portfolio::new(initial_capital),
            queue: Vec::new(),
            actions: FnvHashMap::default(),
            next_order_id: 0,
            risk_limits: None,
        }
    }

    /// Enable pre-submission risk gating; violating orders are rejected
    /// instead of queued.
    pub fn with_risk_limits(mut self, limits: RiskLimits) -> Self {
        self.risk_limits = Some(limits);
        self
    }

    pub fn context(&self) -> &BarContext {
        &self.context
    }

    pub fn broker(&self) -> &SimulatedBroker {
        &self.broker
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Run the full simulation. Open positions are force-closed at the last
    /// bar's close.
    pub fn run<S: Strategy + ?Sized>(
        &mut self,
        strategy: &mut S,
        feed: &dyn DataFeed,
    ) -> Result<(), BarlabError> {
        strategy.on_init(&mut self.context);

        let bars = feed.bars();
        info!(
            total_bars = bars.len(),
            symbol = feed.symbol(),
            "simulation start"
        );

        for (bar_index, bar) in bars.iter().enumerate() {
            self.process_bar(strategy, bar, bar_index)?;
        }

        if let Some(last_bar) = bars.last() {
            self.portfolio
                .close_all(last_bar.close, last_bar.timestamp, bars.len() - 1);
        }

        info!(
            total_bars = bars.len(),
            total_trades = self.portfolio.trade_results().len(),
            "simulation complete"
        );
        Ok(())
    }

    fn process_bar<S: Strategy + ?Sized>(
        &mut self,
        strategy: &mut S,
        bar: &Bar,
        bar_index: usize,
    ) -> Result<(), BarlabError> {
        // Finalize the previous bar's series before anything reads history.
        if bar_index > 0 {
            self.context.commit_all();
        }

        self.context.update(*bar, bar_index);

        // Orders from prior bars match against this bar; the strategy never
        // sees same-bar fills of its own orders.
        let fills = self.broker.match_bar(bar, bar_index);
        for fill in fills {
            let action = self
                .actions
                .remove(&fill.order_id)
                .unwrap_or(OrderAction::Entry);
            self.portfolio.apply_fill(&fill, action, bar_index);
        }

        let outcome = {
            let mut trade_ctx = TradeContext::new(
                &mut self.context,
                &self.portfolio,
                &mut self.queue,
                &mut self.next_order_id,
            );
            strategy.on_bar(&mut trade_ctx)
        };
        if let Err(err) = outcome {
            self.context.rollback_all();
            error!(bar_index, %err, "strategy error");
            return Err(err.into());
        }

        for (mut order, action) in self.queue.drain(..) {
            order.created_bar = bar_index as i64;
            order.created_at = Some(bar.timestamp);

            if let Some(limits) = &self.risk_limits {
                let equity = self.portfolio.equity(bar.close);
                if let Err(err) = limits.validate(
                    &order,
                    self.portfolio.cash(),
                    equity,
                    self.portfolio.peak_equity(),
                    bar.close,
                ) {
                    order.reject();
                    warn!(order_id = %order.id, %err, "order rejected");
                    continue;
                }
            }

            self.actions.insert(order.id, action);
            self.broker.submit(order);
        }

        self.portfolio.record_equity(bar, bar_index);
        Ok(())
    }
}
