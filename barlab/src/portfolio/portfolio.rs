use crate::data::market::Bar;
use crate::execution::fill::Fill;
use crate::execution::order::{OrderAction, Side};
use crate::portfolio::position::{Position, TradeResult};
use barlab_ta::math::safe_div;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::{debug, warn};

/// A single point on the equity curve, recorded once per bar after the
/// strategy has run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Constructor)]
pub struct EquityPoint {
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    pub equity: Decimal,
    pub cash: Decimal,
    pub position_value: Decimal,
    /// Fractional fall from the running equity peak.
    pub drawdown: Decimal,
}

/// Tracks cash, tagged positions and equity over one backtest run.
///
/// A tag identifies at most one open position at a time. Closing a position
/// realizes P&L, moves it to the closed list and appends a flattened
/// [`TradeResult`].
#[derive(Debug, Clone)]
pub struct Portfolio {
    initial_capital: Decimal,
    cash: Decimal,
    positions: IndexMap<SmolStr, Position>,
    closed_positions: Vec<Position>,
    equity_curve: Vec<EquityPoint>,
    peak_equity: Decimal,
    trade_results: Vec<TradeResult>,
}

impl Portfolio {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            positions: IndexMap::new(),
            closed_positions: Vec::new(),
            equity_curve: Vec::new(),
            peak_equity: initial_capital,
            trade_results: Vec::new(),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn peak_equity(&self) -> Decimal {
        self.peak_equity
    }

    pub fn position(&self, tag: &str) -> Option<&Position> {
        self.positions.get(tag)
    }

    pub fn has_position(&self, tag: &str) -> bool {
        self.positions.contains_key(tag)
    }

    /// Open positions in insertion order.
    pub fn open_positions(&self) -> &IndexMap<SmolStr, Position> {
        &self.positions
    }

    pub fn closed_positions(&self) -> &[Position] {
        &self.closed_positions
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn trade_results(&self) -> &[TradeResult] {
        &self.trade_results
    }

    /// Total equity: cash plus mark-to-market value of open positions.
    pub fn equity(&self, current_price: Decimal) -> Decimal {
        self.cash + self.position_value(current_price)
    }

    /// Mark-to-market value of all open positions at the given price.
    ///
    /// A long contributes `price * quantity`; a short contributes its entry
    /// value plus unrealized P&L.
    pub fn position_value(&self, current_price: Decimal) -> Decimal {
        self.positions
            .values()
            .map(|position| match position.side {
                Side::Long => current_price * position.quantity,
                Side::Short => {
                    position.entry_price * position.quantity
                        + position.unrealized_pnl(current_price)
                }
            })
            .sum()
    }

    /// Apply a fill according to its order action.
    pub fn apply_fill(&mut self, fill: &Fill, action: OrderAction, bar_index: usize) {
        let tag: SmolStr = if fill.tag.is_empty() {
            SmolStr::new_static("default")
        } else {
            fill.tag.clone()
        };

        match action {
            OrderAction::Entry => self.open_position(fill, bar_index, tag),
            OrderAction::Exit | OrderAction::Close => self.close_position(fill, bar_index, tag),
        }
    }

    fn open_position(&mut self, fill: &Fill, bar_index: usize, tag: SmolStr) {
        if let Some(existing) = self.positions.get(&tag) {
            if existing.side == fill.side {
                // No averaging into an existing position.
                warn!(%tag, side = %fill.side, "duplicate entry ignored");
                return;
            }
            // Reversal: close the existing position at the fill price first.
            self.force_close(
                &tag,
                fill.price,
                fill.timestamp,
                bar_index,
                fill.commission,
                "",
            );
        }

        let cost = fill.price * fill.quantity;
        match fill.side {
            Side::Long => self.cash -= cost + fill.commission,
            // A short entry receives the sale proceeds.
            Side::Short => self.cash += cost - fill.commission,
        }

        let position = Position::open(
            fill.side,
            fill.price,
            fill.quantity,
            fill.timestamp,
            bar_index,
            tag.clone(),
            fill.commission,
        );
        debug!(
            %tag,
            side = %fill.side,
            price = %fill.price,
            quantity = %fill.quantity,
            "position opened"
        );
        self.positions.insert(tag, position);
    }

    fn close_position(&mut self, fill: &Fill, bar_index: usize, tag: SmolStr) {
        if !self.positions.contains_key(&tag) {
            warn!(%tag, "no position to close");
            return;
        }
        self.force_close(
            &tag,
            fill.price,
            fill.timestamp,
            bar_index,
            fill.commission,
            fill.tag.as_str(),
        );
    }

    fn force_close(
        &mut self,
        tag: &str,
        price: Decimal,
        timestamp: DateTime<Utc>,
        bar_index: usize,
        commission: Decimal,
        exit_tag: &str,
    ) {
        let Some(mut position) = self.positions.shift_remove(tag) else {
            return;
        };
        let pnl = position.close(price, timestamp, bar_index, exit_tag, commission);

        match position.side {
            Side::Long => self.cash += price * position.quantity - commission,
            // Closing a short buys the position back.
            Side::Short => self.cash -= price * position.quantity + commission,
        }

        let trade = TradeResult {
            entry_time: position.entry_time,
            exit_time: timestamp,
            side: position.side,
            entry_price: position.entry_price,
            exit_price: price,
            quantity: position.quantity,
            pnl,
            pnl_pct: position.pnl_pct().unwrap_or(Decimal::ZERO),
            commission: position.commission_entry + position.commission_exit,
            bars_held: position.bars_held().unwrap_or(0),
            entry_tag: position.tag.clone(),
            exit_tag: position.exit_tag.clone(),
        };
        debug!(tag, pnl = %pnl, "position closed");

        self.closed_positions.push(position);
        self.trade_results.push(trade);
    }

    /// Record equity at the close of the current bar.
    pub fn record_equity(&mut self, bar: &Bar, bar_index: usize) -> EquityPoint {
        let position_value = self.position_value(bar.close);
        let equity = self.cash + position_value;

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        let drawdown = safe_div(self.peak_equity - equity, self.peak_equity);

        let point = EquityPoint::new(
            bar_index,
            bar.timestamp,
            equity,
            self.cash,
            position_value,
            drawdown,
        );
        self.equity_curve.push(point.clone());
        point
    }

    /// Force-close every open position at the end of the run with zero
    /// commission.
    pub fn close_all(&mut self, price: Decimal, timestamp: DateTime<Utc>, bar_index: usize) {
        let tags: Vec<SmolStr> = self.positions.keys().cloned().collect();
        for tag in tags {
            self.force_close(
                &tag,
                price,
                timestamp,
                bar_index,
                Decimal::ZERO,
                "backtest_end",
            );
        }
    }
}
