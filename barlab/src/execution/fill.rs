use crate::execution::order::{OrderId, Side};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Immutable execution record generated when the broker matches a pending
/// order against a bar. Sent to the portfolio so it can apply updates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Constructor)]
pub struct Fill {
    pub order_id: OrderId,
    /// Direction of the position the order belongs to (not the cash flow).
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub commission: Decimal,
    pub slippage: Decimal,
    pub timestamp: DateTime<Utc>,
    pub tag: SmolStr,
}
