use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of "something changed" notifications an account raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    OrderUpdate,
    ExecutionUpdate,
    PositionUpdate,
    AccountItemUpdate,
}

impl ChangeKind {
    /// Every notification kind, in subscription order.
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::OrderUpdate,
        ChangeKind::ExecutionUpdate,
        ChangeKind::PositionUpdate,
        ChangeKind::AccountItemUpdate,
    ];
}

/// Connectivity of an account's broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    ConnectionLost,
    Disconnected,
}

impl ConnectionStatus {
    /// Only accounts with an established, healthy connection are broadcast.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPosition {
    Long,
    Short,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
    StopLimit,
    MarketIfTouched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAction {
    Buy,
    BuyToCover,
    Sell,
    SellShort,
}

/// Lifecycle state of an order as reported by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    Initialized,
    Submitted,
    Accepted,
    TriggerPending,
    Working,
    ChangePending,
    ChangeSubmitted,
    CancelPending,
    CancelSubmitted,
    Cancelled,
    Rejected,
    PartFilled,
    Filled,
    Unknown,
}

impl OrderState {
    /// The closed set of states that count as a working order on the wire.
    pub const ACTIVE: [OrderState; 3] = [OrderState::Accepted, OrderState::Working, OrderState::Submitted];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

// Display renders the bare variant name, which is also what the consumer sees.
macro_rules! named_variants {
    ($($ty:ident),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(self, f)
                }
            }
        )*
    };
}

named_variants!(ChangeKind, ConnectionStatus, MarketPosition, OrderType, OrderAction, OrderState);
