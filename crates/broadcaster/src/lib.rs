//! # Broadcaster
//!
//! The composition root. Attaches a coalescer to the four change notifications
//! of every connected account and, on each coalesced cycle, delivers a fresh
//! snapshot of every account that is connected at that moment.

use crate::error::BroadcasterError;
use coalescer::{Coalescer, CycleRunner};
use configuration::Settings;
use core_types::{AccountId, ChangeKind, Diagnostics};
use source::{ChangeHandler, StateSource, SubscriptionId};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use transport::{Transport, WebhookTransport};

pub mod cycle;
pub mod error;

pub use cycle::{BroadcastCycle, CycleReport};

/// One handler attached by `start()`, remembered so `stop()` can detach it.
#[derive(Debug, Clone)]
struct Subscription {
    account: AccountId,
    kind: ChangeKind,
    id: SubscriptionId,
}

pub struct Broadcaster {
    source: Arc<dyn StateSource>,
    coalescer: Coalescer,
    diagnostics: Diagnostics,
    // `None` while stopped.
    subscriptions: Mutex<Option<Vec<Subscription>>>,
}

impl Broadcaster {
    /// Creates a stopped broadcaster. Must be called inside a tokio runtime.
    pub fn new(
        source: Arc<dyn StateSource>,
        transport: Arc<dyn Transport>,
        delay: Duration,
        diagnostics: Diagnostics,
    ) -> Result<Self, BroadcasterError> {
        let cycle: Arc<dyn CycleRunner> = Arc::new(BroadcastCycle::new(
            Arc::clone(&source),
            transport,
            diagnostics.clone(),
        ));
        let coalescer = Coalescer::new(delay, cycle, diagnostics.clone())?;

        Ok(Self {
            source,
            coalescer,
            diagnostics,
            subscriptions: Mutex::new(None),
        })
    }

    /// Creates a broadcaster that posts to the configured webhook.
    pub fn from_settings(
        settings: &Settings,
        source: Arc<dyn StateSource>,
        diagnostics: Diagnostics,
    ) -> Result<Self, BroadcasterError> {
        let transport = WebhookTransport::new(&settings.transport, diagnostics.clone())?;
        Self::new(source, Arc::new(transport), settings.throttle.delay(), diagnostics)
    }

    /// Subscribes to every connected account and sends an initial snapshot.
    ///
    /// Accounts that connect later are still broadcast on every cycle, but
    /// their own notifications are only observed after a restart.
    pub fn start(&self) {
        let mut guard = self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            self.diagnostics.warn("TradeBroadcaster is already started.");
            return;
        }

        let mut attached = Vec::new();
        for account in self.source.connected_accounts() {
            for kind in ChangeKind::ALL {
                let coalescer = self.coalescer.clone();
                let handler: ChangeHandler = Arc::new(move || {
                    coalescer.signal();
                });
                match self.source.subscribe(&account, kind, handler) {
                    Ok(id) => attached.push(Subscription {
                        account: account.clone(),
                        kind,
                        id,
                    }),
                    Err(e) => self
                        .diagnostics
                        .error(&format!("Failed to subscribe to {} for account {}: {}", kind, account, e)),
                }
            }
        }
        tracing::debug!(subscriptions = attached.len(), "Attached change handlers.");
        *guard = Some(attached);
        drop(guard);

        self.diagnostics
            .info("TradeBroadcaster started and subscribed to account events.");
        self.coalescer.flush();
    }

    /// Detaches every handler attached by `start()`.
    ///
    /// Accounts that disconnected in the meantime are detached too. A cycle that
    /// is already scheduled or running is left to finish.
    pub fn stop(&self) {
        let taken = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(subscriptions) = taken else {
            return;
        };

        for subscription in subscriptions {
            if let Err(e) = self
                .source
                .unsubscribe(&subscription.account, subscription.kind, subscription.id)
            {
                self.diagnostics.warn(&format!(
                    "Failed to unsubscribe from {} for account {}: {}",
                    subscription.kind, subscription.account, e
                ));
            }
        }
        self.diagnostics.info("TradeBroadcaster stopped.");
    }

    /// Nudges the coalescer as if a notification had arrived.
    pub fn signal(&self) -> bool {
        self.coalescer.signal()
    }

    pub fn coalescer(&self) -> &Coalescer {
        &self.coalescer
    }

    pub fn is_started(&self) -> bool {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Resolves once no cycle is scheduled or running.
    pub async fn wait_idle(&self) {
        self.coalescer.wait_idle().await;
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.stop();
    }
}
