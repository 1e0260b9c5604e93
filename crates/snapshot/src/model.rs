use crate::error::SnapshotError;
use chrono::{DateTime, Utc};
use core_types::{AccountId, MarketPosition, OrderAction, OrderState, OrderType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A complete, point-in-time snapshot of one account.
///
/// This is exactly the JSON body the webhook consumer receives. A snapshot is
/// produced by [`crate::SnapshotBuilder`], serialized once and then dropped; it
/// is never updated in place.
///
/// Field names are camelCased on the wire, e.g.
/// `{ "timestamp": "...", "account": "Sim101", "balance": 10000.0, ..., "workingOrders": [] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub account: AccountId,
    /// Cash value of the account.
    pub balance: Decimal,
    pub realized: Decimal,
    pub unrealized: Decimal,
    pub positions: Vec<PositionView>,
    pub working_orders: Vec<WorkingOrderView>,
}

impl Snapshot {
    /// Serializes the snapshot into the webhook payload.
    pub fn to_json(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// One open position, as presented to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub instrument: String,
    pub symbol: String,
    pub market_position: MarketPosition,
    pub quantity: i64,
    pub average_price: Decimal,
    pub unrealized: Decimal,
    /// Last traded price, or 0 when the source had no market data.
    pub current_price: Decimal,
}

/// One active order, as presented to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingOrderView {
    pub order_id: String,
    pub instrument: String,
    pub order_type: OrderType,
    pub order_action: OrderAction,
    pub quantity: i64,
    pub filled: i64,
    pub limit_price: Decimal,
    pub stop_price: Decimal,
    pub state: OrderState,
    pub name: String,
    pub oco: String,
    pub is_stop_loss: bool,
    pub is_profit_target: bool,
}
