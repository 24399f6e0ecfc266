use crate::data::market::Bar;
use crate::execution::commission::Commission;
use crate::execution::fill::Fill;
use crate::execution::order::{Order, OrderAction, OrderStatus, OrderType, Side};
use crate::execution::slippage::Slippage;
use rust_decimal::Decimal;
use tracing::debug;

/// Simulated broker matching pending orders against OHLCV bars.
///
/// The event loop calls [`SimulatedBroker::match_bar`] at the *start* of a
/// bar, before the strategy runs, so orders created on bar `n` can only fill
/// against bar `n + 1` - the engine's no-look-ahead guarantee.
///
/// Matching rules:
/// - MARKET fills at the bar's open.
/// - LIMIT fills at the limit price when the bar's range reaches it (low for
///   buys, high for sells).
/// - STOP fills at `max(open, stop)` for buy stops and `min(open, stop)` for
///   sell stops, so gaps through the stop fill at the open.
/// - STOP-LIMIT requires the stop trigger first, then fills per the LIMIT
///   rule.
///
/// Slippage applies only to MARKET and STOP fills; LIMIT and STOP-LIMIT fill
/// at their explicit price.
#[derive(Debug, Clone)]
pub struct SimulatedBroker {
    commission: Commission,
    slippage: Slippage,
    pending: Vec<Order>,
}

impl SimulatedBroker {
    pub fn new(commission: Commission, slippage: Slippage) -> Self {
        Self {
            commission,
            slippage,
            pending: Vec::new(),
        }
    }

    /// Pending orders in submission order.
    pub fn pending(&self) -> &[Order] {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Queue a new order.
    pub fn submit(&mut self, order: Order) {
        debug!(
            order_id = %order.id,
            side = %order.side,
            order_type = %order.order_type,
            quantity = %order.quantity,
            "order submitted"
        );
        self.pending.push(order);
        debug!(queue_len = self.pending.len(), "pending queue length");
    }

    /// Cancel all pending orders, optionally filtered by tag. Returns the
    /// number of orders cancelled.
    pub fn cancel_all(&mut self, tag: Option<&str>) -> usize {
        let mut cancelled = 0;
        self.pending.retain_mut(|order| {
            let matches = tag.is_none_or(|t| order.tag == t);
            if matches {
                order.cancel();
                cancelled += 1;
            }
            !matches
        });
        cancelled
    }

    /// Match every pending order against the given bar, in submission order.
    /// Unfilled orders stay queued; there is no per-bar expiry.
    pub fn match_bar(&mut self, bar: &Bar, _bar_index: usize) -> Vec<Fill> {
        let mut fills = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());

        for mut order in self.pending.drain(..) {
            match Self::try_fill(&self.commission, &self.slippage, &order, bar) {
                Some(fill) => {
                    order.status = OrderStatus::Filled;
                    order.filled_at = Some(bar.timestamp);
                    order.fill_price = Some(fill.price);
                    order.commission = fill.commission;
                    order.slippage = fill.slippage;
                    fills.push(fill);
                }
                None => remaining.push(order),
            }
        }

        self.pending = remaining;
        fills
    }

    fn try_fill(
        commission: &Commission,
        slippage: &Slippage,
        order: &Order,
        bar: &Bar,
    ) -> Option<Fill> {
        let raw_price = match order.order_type {
            OrderType::Market => Some(bar.open),
            OrderType::Limit => Self::check_limit(order, bar),
            OrderType::Stop => Self::check_stop(order, bar),
            OrderType::StopLimit => Self::check_stop_limit(order, bar),
        }?;

        // Exiting a long sells, exiting a short buys.
        let fill_side = match order.action {
            OrderAction::Entry => order.side,
            OrderAction::Exit | OrderAction::Close => order.side.flipped(),
        };

        let (price, slippage_amount) = match order.order_type {
            OrderType::Market | OrderType::Stop => {
                let adjusted = slippage.apply(raw_price, fill_side);
                (adjusted, (adjusted - raw_price).abs())
            }
            OrderType::Limit | OrderType::StopLimit => (raw_price, Decimal::ZERO),
        };

        Some(Fill::new(
            order.id,
            order.side,
            price,
            order.quantity,
            commission.calculate(price, order.quantity),
            slippage_amount,
            bar.timestamp,
            order.tag.clone(),
        ))
    }

    fn check_limit(order: &Order, bar: &Bar) -> Option<Decimal> {
        let limit = order.limit_price?;
        let buys = Self::effectively_buys(order);
        if buys && bar.low <= limit {
            return Some(limit);
        }
        if !buys && bar.high >= limit {
            return Some(limit);
        }
        None
    }

    fn check_stop(order: &Order, bar: &Bar) -> Option<Decimal> {
        let stop = order.stop_price?;
        if Self::effectively_buys(order) {
            // Buy stop triggers when the price rises to it.
            (bar.high >= stop).then(|| bar.open.max(stop))
        } else {
            // Sell stop triggers when the price drops to it.
            (bar.low <= stop).then(|| bar.open.min(stop))
        }
    }

    fn check_stop_limit(order: &Order, bar: &Bar) -> Option<Decimal> {
        Self::check_stop(order, bar)?;
        Self::check_limit(order, bar)
    }

    /// Whether executing this order buys the asset: long entries and short
    /// exits buy, short entries and long exits sell.
    fn effectively_buys(order: &Order) -> bool {
        match (order.side, order.action) {
            (Side::Long, OrderAction::Entry) => true,
            (Side::Long, OrderAction::Exit | OrderAction::Close) => false,
            (Side::Short, OrderAction::Entry) => false,
            (Side::Short, OrderAction::Exit | OrderAction::Close) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::order::{OrderId, OrderStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bar(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: dec!(1000),
        }
    }

    fn broker() -> SimulatedBroker {
        SimulatedBroker::new(Commission::Zero, Slippage::Zero)
    }

    fn order(
        id: u64,
        action: OrderAction,
        side: Side,
        order_type: OrderType,
        limit: Option<Decimal>,
        stop: Option<Decimal>,
    ) -> Order {
        let mut order = Order::new(OrderId(id), action, side, order_type, dec!(10), "t");
        order.limit_price = limit;
        order.stop_price = stop;
        order
    }

    #[test]
    fn test_market_fills_at_open() {
        let mut broker = broker();
        broker.submit(order(
            1,
            OrderAction::Entry,
            Side::Long,
            OrderType::Market,
            None,
            None,
        ));

        let fills = broker.match_bar(&bar(dec!(105), dec!(110), dec!(100), dec!(108)), 1);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, dec!(105));
        assert_eq!(broker.pending_len(), 0);
    }

    #[test]
    fn test_matching_rule_table() {
        struct TestCase {
            action: OrderAction,
            side: Side,
            order_type: OrderType,
            limit: Option<Decimal>,
            stop: Option<Decimal>,
            expected: Option<Decimal>,
        }

        // Bar (O, H, L, C) = (100, 110, 95, 105).
        let test_bar = bar(dec!(100), dec!(110), dec!(95), dec!(105));

        let cases = vec![
            // TC0: long entry limit below reached by the low
            TestCase {
                action: OrderAction::Entry,
                side: Side::Long,
                order_type: OrderType::Limit,
                limit: Some(dec!(97)),
                stop: None,
                expected: Some(dec!(97)),
            },
            // TC1: long entry limit never reached
            TestCase {
                action: OrderAction::Entry,
                side: Side::Long,
                order_type: OrderType::Limit,
                limit: Some(dec!(90)),
                stop: None,
                expected: None,
            },
            // TC2: long exit limit reached by the high
            TestCase {
                action: OrderAction::Exit,
                side: Side::Long,
                order_type: OrderType::Limit,
                limit: Some(dec!(108)),
                stop: None,
                expected: Some(dec!(108)),
            },
            // TC3: short entry limit reached by the high
            TestCase {
                action: OrderAction::Entry,
                side: Side::Short,
                order_type: OrderType::Limit,
                limit: Some(dec!(109)),
                stop: None,
                expected: Some(dec!(109)),
            },
            // TC4: short exit limit reached by the low
            TestCase {
                action: OrderAction::Close,
                side: Side::Short,
                order_type: OrderType::Limit,
                limit: Some(dec!(96)),
                stop: None,
                expected: Some(dec!(96)),
            },
            // TC5: long entry stop above, triggered by the high
            TestCase {
                action: OrderAction::Entry,
                side: Side::Long,
                order_type: OrderType::Stop,
                limit: None,
                stop: Some(dec!(104)),
                expected: Some(dec!(104)),
            },
            // TC6: long exit stop below, fills at min(open, stop)
            TestCase {
                action: OrderAction::Exit,
                side: Side::Long,
                order_type: OrderType::Stop,
                limit: None,
                stop: Some(dec!(98)),
                expected: Some(dec!(98)),
            },
            // TC7: short entry stop below, fills at min(open, stop)
            TestCase {
                action: OrderAction::Entry,
                side: Side::Short,
                order_type: OrderType::Stop,
                limit: None,
                stop: Some(dec!(97)),
                expected: Some(dec!(97)),
            },
            // TC8: short exit stop above, fills at max(open, stop)
            TestCase {
                action: OrderAction::Exit,
                side: Side::Short,
                order_type: OrderType::Stop,
                limit: None,
                stop: Some(dec!(107)),
                expected: Some(dec!(107)),
            },
            // TC9: stop-limit, stop triggered then limit reached
            TestCase {
                action: OrderAction::Entry,
                side: Side::Long,
                order_type: OrderType::StopLimit,
                limit: Some(dec!(99)),
                stop: Some(dec!(104)),
                expected: Some(dec!(99)),
            },
            // TC10: stop-limit, stop never triggered
            TestCase {
                action: OrderAction::Entry,
                side: Side::Long,
                order_type: OrderType::StopLimit,
                limit: Some(dec!(99)),
                stop: Some(dec!(120)),
                expected: None,
            },
        ];

        for (index, case) in cases.into_iter().enumerate() {
            let mut broker = broker();
            broker.submit(order(
                index as u64,
                case.action,
                case.side,
                case.order_type,
                case.limit,
                case.stop,
            ));
            let fills = broker.match_bar(&test_bar, 1);
            let actual = fills.first().map(|f| f.price);
            assert_eq!(actual, case.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_stop_gap_fills_at_open() {
        // Long stop-loss at 95 with a bar gapping down to open 90.
        let mut broker = broker();
        broker.submit(order(
            1,
            OrderAction::Exit,
            Side::Long,
            OrderType::Stop,
            None,
            Some(dec!(95)),
        ));

        let fills = broker.match_bar(&bar(dec!(90), dec!(92), dec!(88), dec!(91)), 1);
        assert_eq!(fills[0].price, dec!(90));
    }

    #[test]
    fn test_unfilled_orders_stay_queued() {
        let mut broker = broker();
        broker.submit(order(
            1,
            OrderAction::Entry,
            Side::Long,
            OrderType::Limit,
            Some(dec!(80)),
            None,
        ));

        let fills = broker.match_bar(&bar(dec!(100), dec!(110), dec!(95), dec!(105)), 1);
        assert!(fills.is_empty());
        assert_eq!(broker.pending_len(), 1);

        // A later bar that reaches the limit fills it.
        let fills = broker.match_bar(&bar(dec!(85), dec!(90), dec!(79), dec!(82)), 2);
        assert_eq!(fills[0].price, dec!(80));
        assert_eq!(broker.pending_len(), 0);
    }

    #[test]
    fn test_fills_follow_submission_order() {
        let mut broker = broker();
        for id in 1..=3 {
            broker.submit(order(
                id,
                OrderAction::Entry,
                Side::Long,
                OrderType::Market,
                None,
                None,
            ));
        }

        let fills = broker.match_bar(&bar(dec!(100), dec!(110), dec!(95), dec!(105)), 1);
        let ids: Vec<u64> = fills.iter().map(|f| f.order_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_slippage_only_on_market_and_stop() {
        let mut broker = SimulatedBroker::new(
            Commission::Zero,
            Slippage::Percentage { rate: dec!(0.01) },
        );
        broker.submit(order(
            1,
            OrderAction::Entry,
            Side::Long,
            OrderType::Market,
            None,
            None,
        ));
        broker.submit(order(
            2,
            OrderAction::Entry,
            Side::Long,
            OrderType::Limit,
            Some(dec!(97)),
            None,
        ));

        let fills = broker.match_bar(&bar(dec!(100), dec!(110), dec!(95), dec!(105)), 1);
        // Market buy pays up 1%.
        assert_eq!(fills[0].price, dec!(101));
        assert_eq!(fills[0].slippage, dec!(1));
        // Limit fills exactly at its price.
        assert_eq!(fills[1].price, dec!(97));
        assert_eq!(fills[1].slippage, dec!(0));
    }

    #[test]
    fn test_exit_market_sell_slips_down() {
        let mut broker = SimulatedBroker::new(
            Commission::Zero,
            Slippage::Percentage { rate: dec!(0.01) },
        );
        broker.submit(order(
            1,
            OrderAction::Close,
            Side::Long,
            OrderType::Market,
            None,
            None,
        ));

        let fills = broker.match_bar(&bar(dec!(100), dec!(110), dec!(95), dec!(105)), 1);
        // Closing a long sells, so slippage cuts the price.
        assert_eq!(fills[0].price, dec!(99));
    }

    #[test]
    fn test_commission_charged_on_fill_price() {
        let mut broker = SimulatedBroker::new(
            Commission::Percentage { rate: dec!(0.001) },
            Slippage::Zero,
        );
        broker.submit(order(
            1,
            OrderAction::Entry,
            Side::Long,
            OrderType::Market,
            None,
            None,
        ));

        let fills = broker.match_bar(&bar(dec!(100), dec!(110), dec!(95), dec!(105)), 1);
        assert_eq!(fills[0].commission, dec!(1)); // 100 * 10 * 0.001
    }

    #[test]
    fn test_cancel_all_with_and_without_tag() {
        let mut broker = broker();
        let mut tagged = order(
            1,
            OrderAction::Entry,
            Side::Long,
            OrderType::Limit,
            Some(dec!(90)),
            None,
        );
        tagged.tag = "a".into();
        let mut other = order(
            2,
            OrderAction::Entry,
            Side::Long,
            OrderType::Limit,
            Some(dec!(91)),
            None,
        );
        other.tag = "b".into();
        broker.submit(tagged);
        broker.submit(other);

        assert_eq!(broker.cancel_all(Some("a")), 1);
        assert_eq!(broker.pending_len(), 1);
        assert_eq!(broker.pending()[0].tag, "b");

        assert_eq!(broker.cancel_all(None), 1);
        assert_eq!(broker.pending_len(), 0);
    }

    #[test]
    fn test_filled_order_metadata() {
        let mut broker = broker();
        let submitted = order(
            7,
            OrderAction::Entry,
            Side::Long,
            OrderType::Market,
            None,
            None,
        );
        assert_eq!(submitted.status, OrderStatus::Pending);
        broker.submit(submitted);

        let fills = broker.match_bar(&bar(dec!(100), dec!(110), dec!(95), dec!(105)), 3);
        assert_eq!(fills[0].order_id, OrderId(7));
        assert_eq!(fills[0].quantity, dec!(10));
    }
}
