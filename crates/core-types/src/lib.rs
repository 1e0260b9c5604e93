//! # Tradecast Core Types
//!
//! Layer 0 of the workspace: the account-state model exposed by a brokerage
//! state source (accounts, positions, orders, balances), the notification kinds
//! it raises, and the diagnostics sink every component reports through.

pub mod diagnostics;
pub mod enums;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use diagnostics::{Diagnostics, LogCallback};
pub use enums::{ChangeKind, ConnectionStatus, MarketPosition, OrderAction, OrderState, OrderType};
pub use structs::{AccountBalances, AccountId, AccountReadout, Instrument, Order, Position};
