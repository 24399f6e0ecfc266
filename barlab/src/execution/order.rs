use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Run-scoped unique order identifier.
///
/// Ids are handed out sequentially by the event loop so that a run's order
/// stream is reproducible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Display,
)]
#[display("{_0}")]
pub struct OrderId(pub u64);

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[display("long")]
    Long,
    #[display("short")]
    Short,
}

impl Side {
    /// The opposite direction.
    pub fn flipped(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

/// Order execution type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[display("market")]
    Market,
    #[display("limit")]
    Limit,
    #[display("stop")]
    Stop,
    #[display("stop_limit")]
    StopLimit,
}

/// What the order does to the position identified by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    #[display("entry")]
    Entry,
    #[display("exit")]
    Exit,
    #[display("close")]
    Close,
}

/// Order lifecycle status: `Pending -> Filled | Cancelled | Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[display("pending")]
    Pending,
    #[display("filled")]
    Filled,
    #[display("cancelled")]
    Cancelled,
    #[display("rejected")]
    Rejected,
}

/// A pending order in the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub action: OrderAction,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
    pub tag: SmolStr,
    /// Bar index the order was created on; `-1` until the loop stamps it.
    pub created_bar: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub filled_at: Option<DateTime<Utc>>,
    pub fill_price: Option<Decimal>,
    pub commission: Decimal,
    pub slippage: Decimal,
}

impl Order {
    pub fn new(
        id: OrderId,
        action: OrderAction,
        side: Side,
        order_type: OrderType,
        quantity: Decimal,
        tag: impl Into<SmolStr>,
    ) -> Self {
        Self {
            id,
            action,
            side,
            order_type,
            quantity,
            limit_price: None,
            stop_price: None,
            status: OrderStatus::Pending,
            tag: tag.into(),
            created_bar: -1,
            created_at: None,
            filled_at: None,
            fill_price: None,
            commission: Decimal::ZERO,
            slippage: Decimal::ZERO,
        }
    }

    pub fn with_limit(mut self, limit_price: Decimal) -> Self {
        self.limit_price = Some(limit_price);
        self
    }

    pub fn with_stop(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
    }

    pub fn reject(&mut self) {
        self.status = OrderStatus::Rejected;
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}
