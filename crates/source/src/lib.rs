use core_types::{AccountId, AccountReadout, ChangeKind, ConnectionStatus};
use std::fmt;
use std::sync::Arc;

pub mod error;
pub mod simulated;

// --- Public API ---
pub use error::SourceError;
pub use simulated::{AccountState, SimulatedSource};

/// A zero-argument "something changed" callback. It carries no data: the
/// receiver is expected to pull current state when it gets around to it.
pub type ChangeHandler = Arc<dyn Fn() + Send + Sync>;

/// Token returned by [`StateSource::subscribe`], used to detach the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// The capability interface a brokerage state source presents to the broadcaster.
///
/// Implementations adapt a live account object model (with its own event
/// mechanism) to this contract, so the broadcaster never depends on how the
/// source raises its notifications. Handlers may be invoked from any thread.
pub trait StateSource: Send + Sync {
    /// Every account the source knows about, connected or not, in a stable order.
    fn accounts(&self) -> Vec<AccountId>;

    /// Current connectivity of an account. Unknown accounts are `Disconnected`.
    fn connection_status(&self, account: &AccountId) -> ConnectionStatus;

    /// Attaches `handler` to one notification kind of one account.
    fn subscribe(
        &self,
        account: &AccountId,
        kind: ChangeKind,
        handler: ChangeHandler,
    ) -> Result<SubscriptionId, SourceError>;

    /// Detaches a handler. Detaching an id that is no longer attached is not an error.
    fn unsubscribe(
        &self,
        account: &AccountId,
        kind: ChangeKind,
        subscription: SubscriptionId,
    ) -> Result<(), SourceError>;

    /// Pulls a full readout of the account's current balances, positions and orders.
    fn readout(&self, account: &AccountId) -> Result<AccountReadout, SourceError>;

    /// Accounts currently eligible for broadcast.
    fn connected_accounts(&self) -> Vec<AccountId> {
        self.accounts()
            .into_iter()
            .filter(|account| self.connection_status(account).is_connected())
            .collect()
    }
}
