//! Strategy trait, order-submission seam and parameter descriptors.

pub mod builtin;
pub mod parameters;

pub use builtin::{RsiReversion, SmaCrossover};
pub use parameters::{ParamDescriptor, ParamKind, ParamValue, ParameterError, Parameters};

use crate::engine::context::BarContext;
use crate::execution::order::{Order, OrderAction, OrderId, OrderType, Side};
use crate::portfolio::portfolio::Portfolio;
use crate::portfolio::position::Position;
use barlab_ta::series::nz;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised from strategy code. The event loop rolls the bar back and
/// aborts the run, preserving partial state for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("strategy: {0}")]
    Execution(String),

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

/// A trading strategy driven bar by bar.
///
/// `on_init` runs once before the first bar to register series and read
/// parameters; `on_bar` runs per bar and may read indicators and submit
/// orders through the [`TradeContext`]. Parameters are exposed as a map so
/// the optimizer can reassign them between trials.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Declared parameter table; the optimizer's search space.
    fn descriptors(&self) -> Vec<ParamDescriptor>;

    /// Current parameter assignment, in declaration order.
    fn parameters(&self) -> Parameters;

    /// Assign parameters from a map. Unknown names are ignored; invalid
    /// values fail the whole assignment.
    fn set_parameters(&mut self, params: &Parameters) -> Result<(), StrategyError>;

    /// Called once before the first bar.
    fn on_init(&mut self, _ctx: &mut BarContext) {}

    /// Called for every bar.
    fn on_bar(&mut self, ctx: &mut TradeContext<'_>) -> Result<(), StrategyError>;
}

/// Per-bar handle passed to [`Strategy::on_bar`].
///
/// Bundles the series context with portfolio reads and order submission.
/// Orders land on a loop-owned queue and are forwarded to the broker after
/// the strategy returns, so nothing submitted on this bar can fill before
/// the next one.
#[derive(Debug)]
pub struct TradeContext<'a> {
    bars: &'a mut BarContext,
    portfolio: &'a Portfolio,
    queue: &'a mut Vec<(Order, OrderAction)>,
    next_order_id: &'a mut u64,
}

impl<'a> TradeContext<'a> {
    pub(crate) fn new(
        bars: &'a mut BarContext,
        portfolio: &'a Portfolio,
        queue: &'a mut Vec<(Order, OrderAction)>,
        next_order_id: &'a mut u64,
    ) -> Self {
        Self {
            bars,
            portfolio,
            queue,
            next_order_id,
        }
    }

    pub fn bars(&self) -> &BarContext {
        self.bars
    }

    pub fn bars_mut(&mut self) -> &mut BarContext {
        self.bars
    }

    pub fn bar_index(&self) -> i64 {
        self.bars.bar_index()
    }

    pub fn cash(&self) -> Decimal {
        self.portfolio.cash()
    }

    pub fn equity(&self, current_price: Decimal) -> Decimal {
        self.portfolio.equity(current_price)
    }

    pub fn position(&self, tag: &str) -> Option<&Position> {
        self.portfolio.position(tag)
    }

    /// Submit an entry order.
    ///
    /// With `quantity = None` the order is auto-sized to 99% of current cash
    /// divided by the current close (zero when the close is not positive),
    /// leaving headroom for commission. The order type follows from which
    /// trigger prices are given: both -> stop-limit, limit -> limit,
    /// stop -> stop, neither -> market.
    pub fn entry(
        &mut self,
        tag: impl Into<SmolStr>,
        side: Side,
        quantity: Option<Decimal>,
        limit: Option<Decimal>,
        stop: Option<Decimal>,
    ) {
        let quantity = quantity.unwrap_or_else(|| {
            let close = nz(self.bars.close.current().ok().flatten());
            if close > Decimal::ZERO {
                (self.portfolio.cash() / close) * Decimal::from(99) / Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            }
        });

        let mut order = Order::new(
            self.next_id(),
            OrderAction::Entry,
            side,
            order_type_for(limit, stop),
            quantity,
            tag,
        );
        order.limit_price = limit;
        order.stop_price = stop;
        self.queue.push((order, OrderAction::Entry));
    }

    /// Submit an exit order against an open position. Does nothing when no
    /// position exists under `from_entry` (or `tag` when absent).
    pub fn exit(
        &mut self,
        tag: impl Into<SmolStr>,
        from_entry: Option<&str>,
        quantity: Option<Decimal>,
        limit: Option<Decimal>,
        stop: Option<Decimal>,
    ) {
        let tag: SmolStr = tag.into();
        let position_tag: SmolStr = from_entry.map(SmolStr::new).unwrap_or_else(|| tag.clone());
        let Some(position) = self.portfolio.position(&position_tag) else {
            return;
        };

        let mut order = Order::new(
            self.next_id(),
            OrderAction::Exit,
            position.side,
            order_type_for(limit, stop),
            quantity.unwrap_or(position.quantity),
            position_tag,
        );
        order.limit_price = limit;
        order.stop_price = stop;
        self.queue.push((order, OrderAction::Exit));
    }

    /// Close a position at market. Does nothing when no position exists.
    pub fn close_position(&mut self, tag: impl Into<SmolStr>) {
        let tag: SmolStr = tag.into();
        let Some(position) = self.portfolio.position(&tag) else {
            return;
        };

        let order = Order::new(
            self.next_id(),
            OrderAction::Close,
            position.side,
            OrderType::Market,
            position.quantity,
            tag,
        );
        self.queue.push((order, OrderAction::Close));
    }

    /// Close every open position at market.
    pub fn close_all(&mut self) {
        let tags: Vec<SmolStr> = self.portfolio.open_positions().keys().cloned().collect();
        for tag in tags {
            self.close_position(tag);
        }
    }

    fn next_id(&mut self) -> OrderId {
        let id = OrderId(*self.next_order_id);
        *self.next_order_id += 1;
        id
    }
}

fn order_type_for(limit: Option<Decimal>, stop: Option<Decimal>) -> OrderType {
    match (limit, stop) {
        (Some(_), Some(_)) => OrderType::StopLimit,
        (Some(_), None) => OrderType::Limit,
        (None, Some(_)) => OrderType::Stop,
        (None, None) => OrderType::Market,
    }
}
