use crate::execution::error::OrderError;
use crate::execution::order::{Order, OrderAction};
use barlab_ta::math::safe_div;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Optional order gating applied at submission time.
///
/// The engine enforces nothing by default; configure limits on the backtest
/// to have violating orders rejected instead of queued.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RiskLimits {
    /// Reject entries whose notional exceeds this percentage of equity.
    pub max_position_pct: Option<Decimal>,
    /// Reject all orders once drawdown from peak equity exceeds this
    /// percentage.
    pub max_drawdown_pct: Option<Decimal>,
    /// Reject entries whose notional exceeds available cash.
    pub require_sufficient_capital: bool,
}

impl RiskLimits {
    pub fn validate(
        &self,
        order: &Order,
        cash: Decimal,
        equity: Decimal,
        peak_equity: Decimal,
        current_price: Decimal,
    ) -> Result<(), OrderError> {
        if let Some(max_dd_pct) = self.max_drawdown_pct {
            let drawdown_pct =
                safe_div(peak_equity - equity, peak_equity) * Decimal::ONE_HUNDRED;
            if drawdown_pct > max_dd_pct {
                return Err(OrderError::RiskLimit(format!(
                    "drawdown ({drawdown_pct}%) exceeds max ({max_dd_pct}%)"
                )));
            }
        }

        if order.action != OrderAction::Entry {
            return Ok(());
        }

        let notional = current_price * order.quantity;

        if self.require_sufficient_capital && notional > cash {
            return Err(OrderError::InsufficientCapital {
                required: notional,
                available: cash,
            });
        }

        if let Some(max_pct) = self.max_position_pct {
            let pct_of_equity = safe_div(notional, equity) * Decimal::ONE_HUNDRED;
            if pct_of_equity > max_pct {
                return Err(OrderError::RiskLimit(format!(
                    "order notional ({pct_of_equity}% of equity) exceeds max position size \
                     ({max_pct}%)"
                )));
            }
        }

        Ok(())
    }
}
