//! # Tradecast Snapshot
//!
//! This crate defines the account snapshot delivered to the remote consumer and
//! the pure builder that derives it from a state-source readout.
//!
//! As a Layer 1 crate, it depends only on `core-types` and is the definitive
//! description of the webhook payload.

// Declare the modules that make up this crate.
pub mod builder;
pub mod error;
pub mod model;

// Re-export the core types to provide a clean public API.
pub use builder::{PROFIT_TARGET_ORDER_NAME, STOP_LOSS_ORDER_NAME, SnapshotBuilder};
pub use error::SnapshotError;
pub use model::{PositionView, Snapshot, WorkingOrderView};
