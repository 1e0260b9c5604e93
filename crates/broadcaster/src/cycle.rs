use crate::error::BroadcasterError;
use async_trait::async_trait;
use coalescer::CycleRunner;
use core_types::{AccountId, Diagnostics};
use futures::FutureExt;
use snapshot::SnapshotBuilder;
use source::StateSource;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;
use transport::Transport;
use uuid::Uuid;

/// Outcome counts of one broadcast cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub delivered: usize,
    pub failed: usize,
}

/// The body of every coalesced cycle: one snapshot per connected account.
pub struct BroadcastCycle {
    source: Arc<dyn StateSource>,
    transport: Arc<dyn Transport>,
    diagnostics: Diagnostics,
}

impl BroadcastCycle {
    pub fn new(source: Arc<dyn StateSource>, transport: Arc<dyn Transport>, diagnostics: Diagnostics) -> Self {
        Self {
            source,
            transport,
            diagnostics,
        }
    }

    /// Reads, builds and sends a snapshot for each account connected right now.
    ///
    /// Accounts are handled one after another. A failure (or panic) for one
    /// account is reported and counted, and the next account is still served.
    pub async fn broadcast(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for account in self.source.connected_accounts() {
            let outcome = AssertUnwindSafe(self.deliver(&account)).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(BroadcasterError::Transport(e))) => {
                    // Already reported to the sink by the transport itself.
                    tracing::warn!(account = %account, error = %e, "Snapshot not delivered.");
                    report.failed += 1;
                }
                Ok(Err(e)) => {
                    self.diagnostics
                        .error(&format!("Error broadcasting account {}: {}", account, e));
                    report.failed += 1;
                }
                Err(_) => {
                    self.diagnostics
                        .error(&format!("Error broadcasting account {}: snapshot task panicked", account));
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn deliver(&self, account: &AccountId) -> Result<(), BroadcasterError> {
        let readout = self.source.readout(account)?;
        let snapshot = SnapshotBuilder::build(&readout);
        tracing::trace!(
            account = %account,
            positions = snapshot.positions.len(),
            working_orders = snapshot.working_orders.len(),
            "Snapshot built."
        );
        self.transport.send(&snapshot).await?;
        Ok(())
    }
}

#[async_trait]
impl CycleRunner for BroadcastCycle {
    async fn run_cycle(&self) -> anyhow::Result<()> {
        let cycle_id = Uuid::new_v4();
        let span = tracing::debug_span!("broadcast_cycle", %cycle_id);

        async {
            let report = self.broadcast().await;
            tracing::debug!(delivered = report.delivered, failed = report.failed, "Broadcast cycle complete.");
        }
        .instrument(span)
        .await;

        Ok(())
    }
}
