//! Built-in example strategies.

use crate::engine::context::{BarContext, SeriesId};
use crate::execution::order::Side;
use crate::strategy::parameters::{ParamDescriptor, ParamValue, Parameters};
use crate::strategy::{Strategy, StrategyError, TradeContext};
use barlab_ta::ta;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Moving-average crossover: long when the fast SMA crosses above the slow
/// SMA, flat when it crosses back under.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    fast_length: i64,
    slow_length: i64,
    fast_ma: Option<SeriesId>,
    slow_ma: Option<SeriesId>,
}

impl SmaCrossover {
    pub fn new(fast_length: i64, slow_length: i64) -> Self {
        Self {
            fast_length,
            slow_length,
            fast_ma: None,
            slow_ma: None,
        }
    }
}

impl Default for SmaCrossover {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn descriptors(&self) -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::int("fast_length", 10, 2, 100, 5).describe("Fast SMA period"),
            ParamDescriptor::int("slow_length", 20, 5, 200, 10).describe("Slow SMA period"),
        ]
    }

    fn parameters(&self) -> Parameters {
        Parameters::from_iter([
            ("fast_length".into(), ParamValue::Int(self.fast_length)),
            ("slow_length".into(), ParamValue::Int(self.slow_length)),
        ])
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<(), StrategyError> {
        for descriptor in self.descriptors() {
            let Some(value) = params.get(&descriptor.name) else {
                continue;
            };
            descriptor.validate(value)?;
            let value = value.as_int().unwrap_or_default();
            match descriptor.name.as_str() {
                "fast_length" => self.fast_length = value,
                "slow_length" => self.slow_length = value,
                _ => {}
            }
        }
        Ok(())
    }

    fn on_init(&mut self, ctx: &mut BarContext) {
        self.fast_ma = Some(ctx.create_series("fast_ma"));
        self.slow_ma = Some(ctx.create_series("slow_ma"));
    }

    fn on_bar(&mut self, ctx: &mut TradeContext<'_>) -> Result<(), StrategyError> {
        let (Some(fast_id), Some(slow_id)) = (self.fast_ma, self.slow_ma) else {
            return Err(StrategyError::Execution(
                "series not registered; on_init did not run".into(),
            ));
        };

        let fast_value = ta::sma(&ctx.bars().close, self.fast_length.max(0) as usize);
        let slow_value = ta::sma(&ctx.bars().close, self.slow_length.max(0) as usize);
        ctx.bars_mut().series_mut(fast_id).set_current(fast_value);
        ctx.bars_mut().series_mut(slow_id).set_current(slow_value);

        let fast = ctx.bars().series(fast_id);
        let slow = ctx.bars().series(slow_id);
        if ta::crossover(fast, slow) {
            ctx.entry("sma_cross", Side::Long, None, None, None);
        } else if ta::crossunder(fast, slow) {
            ctx.close_position("sma_cross");
        }
        Ok(())
    }
}

/// RSI mean reversion: long when RSI drops below the oversold level, flat
/// when it rises above the overbought level.
#[derive(Debug, Clone)]
pub struct RsiReversion {
    rsi_length: i64,
    oversold: Decimal,
    overbought: Decimal,
}

impl RsiReversion {
    pub fn new(rsi_length: i64, oversold: Decimal, overbought: Decimal) -> Self {
        Self {
            rsi_length,
            oversold,
            overbought,
        }
    }
}

impl Default for RsiReversion {
    fn default() -> Self {
        Self::new(14, dec!(30), dec!(70))
    }
}

impl Strategy for RsiReversion {
    fn name(&self) -> &str {
        "rsi_reversion"
    }

    fn descriptors(&self) -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::int("rsi_length", 14, 2, 50, 2).describe("RSI period"),
            ParamDescriptor::dec("oversold", dec!(30), dec!(10), dec!(50), dec!(5))
                .describe("Oversold level"),
            ParamDescriptor::dec("overbought", dec!(70), dec!(50), dec!(90), dec!(5))
                .describe("Overbought level"),
        ]
    }

    fn parameters(&self) -> Parameters {
        Parameters::from_iter([
            ("rsi_length".into(), ParamValue::Int(self.rsi_length)),
            ("oversold".into(), ParamValue::Dec(self.oversold)),
            ("overbought".into(), ParamValue::Dec(self.overbought)),
        ])
    }

    fn set_parameters(&mut self, params: &Parameters) -> Result<(), StrategyError> {
        for descriptor in self.descriptors() {
            let Some(value) = params.get(&descriptor.name) else {
                continue;
            };
            descriptor.validate(value)?;
            match descriptor.name.as_str() {
                "rsi_length" => self.rsi_length = value.as_int().unwrap_or_default(),
                "oversold" => self.oversold = value.as_decimal().unwrap_or_default(),
                "overbought" => self.overbought = value.as_decimal().unwrap_or_default(),
                _ => {}
            }
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &mut TradeContext<'_>) -> Result<(), StrategyError> {
        let rsi_value = ta::rsi(&ctx.bars().close, self.rsi_length.max(0) as usize);

        if rsi_value < self.oversold {
            ctx.entry("rsi_mr", Side::Long, None, None, None);
        } else if rsi_value > self.overbought {
            ctx.close_position("rsi_mr");
        }
        Ok(())
    }
}
