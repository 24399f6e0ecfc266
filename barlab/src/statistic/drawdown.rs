use crate::portfolio::portfolio::EquityPoint;
use barlab_ta::math::safe_div;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One peak-to-trough decline of the equity curve.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DrawdownEpisode {
    pub peak_equity: Decimal,
    pub trough_equity: Decimal,
    pub amount: Decimal,
    pub pct: Decimal,
    pub peak_bar: usize,
    pub trough_bar: usize,
    /// Bar at which equity regained the peak; absent when the episode was
    /// still open at the end of the run.
    pub recovery_bar: Option<usize>,
    pub duration_bars: usize,
}

/// Episodes below this floor are noise and ignored.
const EPISODE_FLOOR_PCT: Decimal = dec!(0.01);

/// Every drawdown episode of the curve, in chronological order.
pub fn find_drawdowns(equity_curve: &[EquityPoint]) -> Vec<DrawdownEpisode> {
    let Some(first) = equity_curve.first() else {
        return Vec::new();
    };

    let mut episodes = Vec::new();
    let mut peak = first.equity;
    let mut peak_bar = 0usize;
    let mut trough = peak;
    let mut trough_bar = 0usize;
    let mut in_drawdown = false;

    for (i, point) in equity_curve.iter().enumerate() {
        if point.equity >= peak {
            if in_drawdown {
                if let Some(episode) =
                    episode_if_material(peak, trough, peak_bar, trough_bar, Some(i), i - peak_bar)
                {
                    episodes.push(episode);
                }
            }
            peak = point.equity;
            peak_bar = i;
            trough = peak;
            trough_bar = i;
            in_drawdown = false;
        } else {
            in_drawdown = true;
            if point.equity < trough {
                trough = point.equity;
                trough_bar = i;
            }
        }
    }

    // An episode still open at the end of the run.
    if in_drawdown {
        if let Some(episode) = episode_if_material(
            peak,
            trough,
            peak_bar,
            trough_bar,
            None,
            equity_curve.len() - peak_bar,
        ) {
            episodes.push(episode);
        }
    }

    episodes
}

/// The `n` deepest episodes, ordered by depth.
pub fn top_drawdowns(equity_curve: &[EquityPoint], n: usize) -> Vec<DrawdownEpisode> {
    let mut episodes = find_drawdowns(equity_curve);
    episodes.sort_by(|a, b| b.pct.cmp(&a.pct));
    episodes.truncate(n);
    episodes
}

/// Deepest absolute fall from a running peak.
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> Decimal {
    let Some(first) = equity_curve.first() else {
        return Decimal::ZERO;
    };
    let mut peak = first.equity;
    let mut max_dd = Decimal::ZERO;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        let dd = peak - point.equity;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Deepest percentage fall from a running peak.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> Decimal {
    let Some(first) = equity_curve.first() else {
        return Decimal::ZERO;
    };
    let mut peak = first.equity;
    let mut max_dd_pct = Decimal::ZERO;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        let dd_pct = safe_div(peak - point.equity, peak) * Decimal::ONE_HUNDRED;
        if dd_pct > max_dd_pct {
            max_dd_pct = dd_pct;
        }
    }
    max_dd_pct
}

fn episode_if_material(
    peak: Decimal,
    trough: Decimal,
    peak_bar: usize,
    trough_bar: usize,
    recovery_bar: Option<usize>,
    duration_bars: usize,
) -> Option<DrawdownEpisode> {
    if peak <= Decimal::ZERO {
        return None;
    }
    let pct = (peak - trough) / peak * Decimal::ONE_HUNDRED;
    (pct > EPISODE_FLOOR_PCT).then(|| DrawdownEpisode {
        peak_equity: peak,
        trough_equity: trough,
        amount: peak - trough,
        pct,
        peak_bar,
        trough_bar,
        recovery_bar,
        duration_bars,
    })
}
