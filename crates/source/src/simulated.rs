use crate::error::SourceError;
use crate::{ChangeHandler, StateSource, SubscriptionId};
use core_types::{
    AccountBalances, AccountId, AccountReadout, ChangeKind, ConnectionStatus, Order, Position,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// The mutable state of one simulated account.
#[derive(Debug, Clone, Default)]
pub struct AccountState {
    pub balances: AccountBalances,
    pub positions: Vec<Position>,
    pub orders: Vec<Order>,
}

struct SimulatedAccount {
    status: ConnectionStatus,
    state: AccountState,
    readout_failure: Option<String>,
    handlers: HashMap<ChangeKind, Vec<(SubscriptionId, ChangeHandler)>>,
}

/// An in-memory, multi-account state source.
///
/// Mutations raise the matching [`ChangeKind`] notification to every attached
/// handler, after the internal lock has been released, so handlers are free to
/// call back into the source.
#[derive(Default)]
pub struct SimulatedSource {
    accounts: RwLock<BTreeMap<AccountId, SimulatedAccount>>,
    next_subscription: AtomicU64,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account with the given state and connectivity.
    /// Re-adding an existing account replaces its state but keeps its handlers.
    pub fn add_account(&self, account: AccountId, status: ConnectionStatus, state: AccountState) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        match accounts.get_mut(&account) {
            Some(existing) => {
                existing.status = status;
                existing.state = state;
            }
            None => {
                accounts.insert(
                    account,
                    SimulatedAccount {
                        status,
                        state,
                        readout_failure: None,
                        handlers: HashMap::new(),
                    },
                );
            }
        }
    }

    pub fn set_connection_status(
        &self,
        account: &AccountId,
        status: ConnectionStatus,
    ) -> Result<(), SourceError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let entry = accounts
            .get_mut(account)
            .ok_or_else(|| SourceError::UnknownAccount(account.clone()))?;
        entry.status = status;
        Ok(())
    }

    /// Makes every subsequent readout of `account` fail with `reason`, or clears the failure.
    pub fn set_readout_failure(
        &self,
        account: &AccountId,
        reason: Option<String>,
    ) -> Result<(), SourceError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let entry = accounts
            .get_mut(account)
            .ok_or_else(|| SourceError::UnknownAccount(account.clone()))?;
        entry.readout_failure = reason;
        Ok(())
    }

    /// Applies `mutate` to the account's state, then raises `kind`.
    pub fn modify<F>(&self, account: &AccountId, kind: ChangeKind, mutate: F) -> Result<(), SourceError>
    where
        F: FnOnce(&mut AccountState),
    {
        let handlers = {
            let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
            let entry = accounts
                .get_mut(account)
                .ok_or_else(|| SourceError::UnknownAccount(account.clone()))?;
            mutate(&mut entry.state);
            Self::handlers_of(entry, kind)
        };
        Self::fire(account, kind, handlers);
        Ok(())
    }

    pub fn set_balances(&self, account: &AccountId, balances: AccountBalances) -> Result<(), SourceError> {
        self.modify(account, ChangeKind::AccountItemUpdate, |state| state.balances = balances)
    }

    /// Inserts or replaces the position on the same instrument. A zero quantity closes it.
    pub fn upsert_position(&self, account: &AccountId, position: Position) -> Result<(), SourceError> {
        self.modify(account, ChangeKind::PositionUpdate, |state| {
            state
                .positions
                .retain(|p| p.instrument.full_name != position.instrument.full_name);
            if position.quantity != 0 {
                state.positions.push(position);
            }
        })
    }

    /// Inserts or replaces the order with the same id.
    pub fn upsert_order(&self, account: &AccountId, order: Order) -> Result<(), SourceError> {
        self.modify(account, ChangeKind::OrderUpdate, |state| {
            match state.orders.iter().position(|o| o.order_id == order.order_id) {
                Some(index) => state.orders[index] = order,
                None => state.orders.push(order),
            }
        })
    }

    /// Raises an execution notification without changing state.
    pub fn record_execution(&self, account: &AccountId) -> Result<(), SourceError> {
        self.modify(account, ChangeKind::ExecutionUpdate, |_| {})
    }

    /// Number of handlers currently attached to one notification kind of an account.
    pub fn subscriber_count(&self, account: &AccountId, kind: ChangeKind) -> usize {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts
            .get(account)
            .and_then(|entry| entry.handlers.get(&kind))
            .map_or(0, Vec::len)
    }

    fn handlers_of(entry: &SimulatedAccount, kind: ChangeKind) -> Vec<ChangeHandler> {
        entry
            .handlers
            .get(&kind)
            .map(|attached| attached.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default()
    }

    fn fire(account: &AccountId, kind: ChangeKind, handlers: Vec<ChangeHandler>) {
        tracing::trace!(account = %account, %kind, handlers = handlers.len(), "Raising notification.");
        for handler in handlers {
            handler();
        }
    }
}

impl StateSource for SimulatedSource {
    fn accounts(&self) -> Vec<AccountId> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.keys().cloned().collect()
    }

    fn connection_status(&self, account: &AccountId) -> ConnectionStatus {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts
            .get(account)
            .map_or(ConnectionStatus::Disconnected, |entry| entry.status)
    }

    fn subscribe(
        &self,
        account: &AccountId,
        kind: ChangeKind,
        handler: ChangeHandler,
    ) -> Result<SubscriptionId, SourceError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let entry = accounts
            .get_mut(account)
            .ok_or_else(|| SourceError::UnknownAccount(account.clone()))?;
        let id = SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        entry.handlers.entry(kind).or_default().push((id, handler));
        Ok(id)
    }

    fn unsubscribe(
        &self,
        account: &AccountId,
        kind: ChangeKind,
        subscription: SubscriptionId,
    ) -> Result<(), SourceError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let entry = accounts
            .get_mut(account)
            .ok_or_else(|| SourceError::UnknownAccount(account.clone()))?;
        if let Some(attached) = entry.handlers.get_mut(&kind) {
            attached.retain(|(id, _)| *id != subscription);
        }
        Ok(())
    }

    fn readout(&self, account: &AccountId) -> Result<AccountReadout, SourceError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        let entry = accounts
            .get(account)
            .ok_or_else(|| SourceError::UnknownAccount(account.clone()))?;
        if let Some(reason) = &entry.readout_failure {
            return Err(SourceError::Readout {
                account: account.clone(),
                reason: reason.clone(),
            });
        }
        Ok(AccountReadout {
            account: account.clone(),
            balances: entry.state.balances.clone(),
            positions: entry.state.positions.clone(),
            orders: entry.state.orders.clone(),
        })
    }
}
