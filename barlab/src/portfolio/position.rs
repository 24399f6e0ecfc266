use crate::execution::order::Side;
use barlab_ta::math::safe_div;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Position status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Open exposure resulting from an ENTRY fill, identified by its tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Position {
    pub side: Side,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub entry_time: DateTime<Utc>,
    pub entry_bar: usize,
    pub tag: SmolStr,
    pub status: PositionStatus,
    pub exit_price: Option<Decimal>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_bar: Option<usize>,
    pub exit_tag: SmolStr,
    pub commission_entry: Decimal,
    pub commission_exit: Decimal,
}

impl Position {
    pub fn open(
        side: Side,
        entry_price: Decimal,
        quantity: Decimal,
        entry_time: DateTime<Utc>,
        entry_bar: usize,
        tag: impl Into<SmolStr>,
        commission_entry: Decimal,
    ) -> Self {
        Self {
            side,
            entry_price,
            quantity,
            entry_time,
            entry_bar,
            tag: tag.into(),
            status: PositionStatus::Open,
            exit_price: None,
            exit_time: None,
            exit_bar: None,
            exit_tag: SmolStr::default(),
            commission_entry,
            commission_exit: Decimal::ZERO,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    /// Unrealized P&L at the given price.
    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        match self.side {
            Side::Long => (current_price - self.entry_price) * self.quantity,
            Side::Short => (self.entry_price - current_price) * self.quantity,
        }
    }

    /// Close the position and return the realized P&L net of commissions.
    pub fn close(
        &mut self,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
        exit_bar: usize,
        exit_tag: impl Into<SmolStr>,
        commission: Decimal,
    ) -> Decimal {
        self.exit_price = Some(exit_price);
        self.exit_time = Some(exit_time);
        self.exit_bar = Some(exit_bar);
        self.exit_tag = exit_tag.into();
        self.commission_exit = commission;
        self.status = PositionStatus::Closed;

        self.unrealized_pnl(exit_price) - self.commission_entry - self.commission_exit
    }

    pub fn bars_held(&self) -> Option<usize> {
        self.exit_bar.map(|exit_bar| exit_bar - self.entry_bar)
    }

    /// Realized P&L, available once the position is closed.
    pub fn pnl(&self) -> Option<Decimal> {
        let exit_price = self.exit_price?;
        Some(self.unrealized_pnl(exit_price) - self.commission_entry - self.commission_exit)
    }

    /// Realized P&L as a percentage of the entry cost basis.
    pub fn pnl_pct(&self) -> Option<Decimal> {
        let pnl = self.pnl()?;
        let cost_basis = self.entry_price * self.quantity;
        Some(safe_div(pnl, cost_basis) * Decimal::ONE_HUNDRED)
    }
}

/// Flattened, immutable record of a completed round-trip trade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TradeResult {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub side: Side,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub pnl: Decimal,
    pub pnl_pct: Decimal,
    pub commission: Decimal,
    pub bars_held: usize,
    pub entry_tag: SmolStr,
    pub exit_tag: SmolStr,
}
