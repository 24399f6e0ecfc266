use crate::portfolio::portfolio::EquityPoint;
use crate::portfolio::position::TradeResult;
use crate::statistic::dispersion::{mean, std_dev};
use crate::statistic::drawdown::{DrawdownEpisode, max_drawdown, max_drawdown_pct, top_drawdowns};
use barlab_ta::math::{safe_div, sqrt};
use crate::execution::order::Side;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Annualization factor for bar-to-bar returns.
pub const PERIODS_PER_YEAR: u32 = 252;

/// Saturation value for ratios whose denominator vanishes while gains
/// remain, e.g. a profit factor with no losing trades.
const SATURATED: Decimal = dec!(999);

/// Number of drawdown episodes surfaced on the result.
const TOP_DRAWDOWN_COUNT: usize = 5;

/// Aggregate performance metrics of one backtest run, computed in fixed
/// precision from the trade record and equity curve.
///
/// Risk-adjusted ratios annualize bar-to-bar simple returns; see
/// <https://www.investopedia.com/articles/07/sharpe_ratio.asp>.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricsSummary {
    // Totals
    pub total_return: Decimal,
    pub total_return_pct: Decimal,
    pub final_equity: Decimal,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    pub total_commission: Decimal,

    // Risk-adjusted
    pub sharpe_ratio: Decimal,
    pub sortino_ratio: Decimal,
    pub calmar_ratio: Decimal,

    // Drawdowns
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    pub top_drawdowns: Vec<DrawdownEpisode>,

    // Trade statistics
    pub win_rate: Decimal,
    pub profit_factor: Decimal,
    pub avg_pnl: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub avg_bars_held: Decimal,
    pub expectancy: Decimal,
    pub recovery_factor: Decimal,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl MetricsSummary {
    pub fn compute(
        trades: &[TradeResult],
        equity_curve: &[EquityPoint],
        initial_capital: Decimal,
    ) -> Self {
        Self::compute_with_periods(trades, equity_curve, initial_capital, PERIODS_PER_YEAR)
    }

    pub fn compute_with_periods(
        trades: &[TradeResult],
        equity_curve: &[EquityPoint],
        initial_capital: Decimal,
        periods_per_year: u32,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|point| point.equity)
            .unwrap_or(initial_capital);
        let total_return = final_equity - initial_capital;
        let total_return_pct = safe_div(total_return, initial_capital) * Decimal::ONE_HUNDRED;

        let returns = equity_returns(equity_curve);
        let annualize = sqrt(Decimal::from(periods_per_year));

        let sharpe_ratio = {
            let sigma = std_dev(&returns);
            if returns.len() < 2 || sigma.is_zero() {
                Decimal::ZERO
            } else {
                safe_div(mean(&returns), sigma) * annualize
            }
        };

        let sortino_ratio = {
            let mu = mean(&returns);
            let downside: Vec<Decimal> = returns
                .iter()
                .copied()
                .filter(|r| *r < Decimal::ZERO)
                .collect();
            if returns.len() < 2 {
                Decimal::ZERO
            } else if downside.is_empty() {
                if mu > Decimal::ZERO { SATURATED } else { Decimal::ZERO }
            } else {
                let downside_dev = std_dev(&downside);
                if downside_dev.is_zero() {
                    Decimal::ZERO
                } else {
                    safe_div(mu, downside_dev) * annualize
                }
            }
        };

        let max_dd = max_drawdown(equity_curve);
        let max_dd_pct = max_drawdown_pct(equity_curve);
        let calmar_ratio = safe_div(total_return_pct, max_dd_pct);
        let recovery_factor = safe_div(total_return, max_dd);

        let winners: Vec<&TradeResult> = trades.iter().filter(|t| t.pnl > Decimal::ZERO).collect();
        let losers: Vec<&TradeResult> = trades.iter().filter(|t| t.pnl <= Decimal::ZERO).collect();

        let gross_profit: Decimal = winners.iter().map(|t| t.pnl).sum();
        let gross_loss: Decimal = losers
            .iter()
            .map(|t| t.pnl)
            .sum::<Decimal>()
            .abs();

        let profit_factor = if gross_loss.is_zero() {
            if gross_profit.is_zero() {
                Decimal::ZERO
            } else {
                SATURATED
            }
        } else {
            gross_profit / gross_loss
        };

        let total = Decimal::from(trades.len() as u64);
        let win_rate = safe_div(Decimal::from(winners.len() as u64), total) * Decimal::ONE_HUNDRED;
        let avg_pnl = safe_div(trades.iter().map(|t| t.pnl).sum(), total);
        let avg_win = safe_div(gross_profit, Decimal::from(winners.len() as u64));
        let avg_loss = safe_div(
            losers.iter().map(|t| t.pnl).sum::<Decimal>(),
            Decimal::from(losers.len() as u64),
        );

        let expectancy = {
            let wr = win_rate / Decimal::ONE_HUNDRED;
            let lr = Decimal::ONE - wr;
            wr * avg_win - lr * avg_loss.abs()
        };

        let (max_consecutive_wins, max_consecutive_losses) = consecutive_runs(trades);

        Self {
            total_return,
            total_return_pct,
            final_equity,
            total_trades: trades.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            long_trades: trades.iter().filter(|t| t.side == Side::Long).count(),
            short_trades: trades.iter().filter(|t| t.side == Side::Short).count(),
            total_commission: trades.iter().map(|t| t.commission).sum(),
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            max_drawdown: max_dd,
            max_drawdown_pct: max_dd_pct,
            top_drawdowns: top_drawdowns(equity_curve, TOP_DRAWDOWN_COUNT),
            win_rate,
            profit_factor,
            avg_pnl,
            avg_win,
            avg_loss,
            largest_win: trades.iter().map(|t| t.pnl).max().unwrap_or(Decimal::ZERO),
            largest_loss: trades.iter().map(|t| t.pnl).min().unwrap_or(Decimal::ZERO),
            avg_bars_held: safe_div(
                Decimal::from(trades.iter().map(|t| t.bars_held as u64).sum::<u64>()),
                total,
            ),
            expectancy,
            recovery_factor,
            max_consecutive_wins,
            max_consecutive_losses,
        }
    }
}

/// Bar-to-bar simple returns of the equity curve.
fn equity_returns(equity_curve: &[EquityPoint]) -> Vec<Decimal> {
    equity_curve
        .windows(2)
        .map(|pair| safe_div(pair[1].equity - pair[0].equity, pair[0].equity))
        .collect()
}

fn consecutive_runs(trades: &[TradeResult]) -> (usize, usize) {
    let mut max_wins = 0;
    let mut max_losses = 0;
    let mut wins = 0;
    let mut losses = 0;
    for trade in trades {
        if trade.pnl > Decimal::ZERO {
            wins += 1;
            losses = 0;
            max_wins = max_wins.max(wins);
        } else {
            losses += 1;
            wins = 0;
            max_losses = max_losses.max(losses);
        }
    }
    (max_wins, max_losses)
}
