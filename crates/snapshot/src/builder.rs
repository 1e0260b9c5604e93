use crate::model::{PositionView, Snapshot, WorkingOrderView};
use chrono::{DateTime, Utc};
use core_types::{AccountReadout, Order, Position};
use rust_decimal::Decimal;

/// Order name the platform gives to the stop leg of an exit bracket.
pub const STOP_LOSS_ORDER_NAME: &str = "Stop loss";
/// Order name the platform gives to the target leg of an exit bracket.
pub const PROFIT_TARGET_ORDER_NAME: &str = "Profit target";

/// Turns an account readout into an immutable [`Snapshot`].
///
/// The builder is a pure function of its input: it never touches the network,
/// holds no state, and only reads the readout it is given.
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Builds a snapshot stamped with the current UTC time.
    pub fn build(readout: &AccountReadout) -> Snapshot {
        Self::build_at(readout, Utc::now())
    }

    pub fn build_at(readout: &AccountReadout, timestamp: DateTime<Utc>) -> Snapshot {
        let balances = &readout.balances;
        Snapshot {
            timestamp,
            account: readout.account.clone(),
            balance: balances.cash_value.unwrap_or(Decimal::ZERO),
            realized: balances.realized_pnl.unwrap_or(Decimal::ZERO),
            unrealized: balances.unrealized_pnl.unwrap_or(Decimal::ZERO),
            positions: readout.positions.iter().map(PositionView::from).collect(),
            working_orders: readout
                .orders
                .iter()
                .filter(|order| order.state.is_active())
                .map(WorkingOrderView::from)
                .collect(),
        }
    }
}

impl From<&Position> for PositionView {
    fn from(position: &Position) -> Self {
        Self {
            instrument: position.instrument.full_name.clone(),
            symbol: position.instrument.symbol.clone(),
            market_position: position.market_position,
            quantity: position.quantity,
            average_price: position.average_price,
            unrealized: position.unrealized_pnl,
            current_price: position.last_price.unwrap_or(Decimal::ZERO),
        }
    }
}

impl From<&Order> for WorkingOrderView {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            instrument: order.instrument.full_name.clone(),
            order_type: order.order_type,
            order_action: order.action,
            quantity: order.quantity,
            filled: order.filled,
            limit_price: order.limit_price,
            stop_price: order.stop_price,
            state: order.state,
            name: order.name.clone(),
            oco: order.oco.clone(),
            is_stop_loss: order.name == STOP_LOSS_ORDER_NAME,
            is_profit_target: order.name == PROFIT_TARGET_ORDER_NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::{
        AccountBalances, AccountId, Instrument, MarketPosition, OrderAction, OrderState, OrderType,
    };
    use rust_decimal_macros::dec;

    fn es() -> Instrument {
        Instrument::new("ES 03-25", "ES")
    }

    fn order(id: &str, state: OrderState, name: &str) -> Order {
        Order {
            order_id: id.to_string(),
            instrument: es(),
            order_type: OrderType::StopMarket,
            action: OrderAction::Sell,
            quantity: 2,
            filled: 0,
            limit_price: Decimal::ZERO,
            stop_price: dec!(5900.25),
            state,
            name: name.to_string(),
            oco: "bracket-1".to_string(),
        }
    }

    fn readout_with_orders(orders: Vec<Order>) -> AccountReadout {
        AccountReadout {
            orders,
            ..AccountReadout::empty(AccountId::new("Sim101"))
        }
    }

    #[test]
    fn keeps_only_accepted_working_and_submitted_orders() {
        let readout = readout_with_orders(vec![
            order("1", OrderState::Accepted, "Entry"),
            order("2", OrderState::Working, "Entry"),
            order("3", OrderState::Submitted, "Entry"),
            order("4", OrderState::Filled, "Entry"),
            order("5", OrderState::Cancelled, "Entry"),
        ]);

        let snapshot = SnapshotBuilder::build(&readout);

        let ids: Vec<_> = snapshot.working_orders.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn derives_bracket_flags_from_exact_order_names() {
        let readout = readout_with_orders(vec![
            order("sl", OrderState::Working, "Stop loss"),
            order("pt", OrderState::Working, "Profit target"),
            order("lower", OrderState::Working, "stop loss"),
            order("padded", OrderState::Working, "Profit target "),
            order("plain", OrderState::Working, "Entry"),
        ]);

        let flags: Vec<_> = SnapshotBuilder::build(&readout)
            .working_orders
            .iter()
            .map(|o| (o.order_id.clone(), o.is_stop_loss, o.is_profit_target))
            .collect();

        assert_eq!(
            flags,
            vec![
                ("sl".to_string(), true, false),
                ("pt".to_string(), false, true),
                ("lower".to_string(), false, false),
                ("padded".to_string(), false, false),
                ("plain".to_string(), false, false),
            ]
        );
    }

    #[test]
    fn missing_market_data_and_balances_default_to_zero() {
        let readout = AccountReadout {
            balances: AccountBalances {
                cash_value: Some(dec!(10000)),
                realized_pnl: None,
                unrealized_pnl: None,
            },
            positions: vec![Position {
                instrument: es(),
                market_position: MarketPosition::Long,
                quantity: 2,
                average_price: dec!(100),
                unrealized_pnl: dec!(-12.5),
                last_price: None,
            }],
            ..AccountReadout::empty(AccountId::new("Sim101"))
        };

        let snapshot = SnapshotBuilder::build(&readout);

        assert_eq!(snapshot.balance, dec!(10000));
        assert_eq!(snapshot.realized, Decimal::ZERO);
        assert_eq!(snapshot.unrealized, Decimal::ZERO);
        assert_eq!(snapshot.positions[0].current_price, Decimal::ZERO);
        assert_eq!(snapshot.positions[0].symbol, "ES");
        assert_eq!(snapshot.positions[0].instrument, "ES 03-25");
    }

    #[test]
    fn serializes_to_the_webhook_shape() {
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let mut readout = readout_with_orders(vec![order("sl", OrderState::Working, "Stop loss")]);
        readout.balances.cash_value = Some(dec!(50000));
        readout.positions.push(Position {
            instrument: es(),
            market_position: MarketPosition::Short,
            quantity: 1,
            average_price: dec!(5925.5),
            unrealized_pnl: dec!(125.5),
            last_price: Some(dec!(5863.25)),
        });

        let bytes = SnapshotBuilder::build_at(&readout, timestamp).to_json().unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["account"], "Sim101");
        assert_eq!(body["timestamp"], "2025-03-14T15:09:26Z");
        assert_eq!(body["balance"].as_f64(), Some(50000.0));
        assert_eq!(body["positions"][0]["marketPosition"], "Short");
        assert_eq!(body["positions"][0]["currentPrice"].as_f64(), Some(5863.25));
        let working = &body["workingOrders"][0];
        assert_eq!(working["orderType"], "StopMarket");
        assert_eq!(working["orderAction"], "Sell");
        assert_eq!(working["state"], "Working");
        assert_eq!(working["oco"], "bracket-1");
        assert_eq!(working["isStopLoss"], true);
        assert_eq!(working["isProfitTarget"], false);
    }
}
