use crate::enums::{MarketPosition, OrderAction, OrderState, OrderType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one brokerage account exposed by the state source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AccountId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A tradable contract, e.g. full name "ES 03-25" with master symbol "ES".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub full_name: String,
    pub symbol: String,
}

impl Instrument {
    pub fn new(full_name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            symbol: symbol.into(),
        }
    }
}

/// Account-level figures in the account's base currency.
///
/// `None` means the source did not report that item at read time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountBalances {
    pub cash_value: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
}

/// An open position as reported by the state source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub instrument: Instrument,
    pub market_position: MarketPosition,
    pub quantity: i64,
    pub average_price: Decimal,
    pub unrealized_pnl: Decimal,
    /// Last traded price of the instrument, if market data is available.
    pub last_price: Option<Decimal>,
}

/// An order as reported by the state source, in any lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub instrument: Instrument,
    pub order_type: OrderType,
    pub action: OrderAction,
    pub quantity: i64,
    pub filled: i64,
    pub limit_price: Decimal,
    pub stop_price: Decimal,
    pub state: OrderState,
    pub name: String,
    /// Identifier of the one-cancels-other group; empty when unlinked.
    pub oco: String,
}

/// A full point-in-time readout of one account, pulled on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountReadout {
    pub account: AccountId,
    pub balances: AccountBalances,
    pub positions: Vec<Position>,
    pub orders: Vec<Order>,
}

impl AccountReadout {
    /// An empty readout: no reported balances, positions or orders.
    pub fn empty(account: AccountId) -> Self {
        Self {
            account,
            balances: AccountBalances::default(),
            positions: Vec::new(),
            orders: Vec::new(),
        }
    }
}
