use crate::error::CoalescerError;
use crate::state::{AtomicThrottle, ThrottleState};
use crate::CycleRunner;
use core_types::Diagnostics;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Prefix of every message reported when a cycle body fails.
pub const CYCLE_FAILURE_PREFIX: &str = "Unhandled exception in update task";

/// The throttle/debounce engine.
///
/// Cloning is cheap and every clone drives the same throttle, so a clone can be
/// handed to each producer.
#[derive(Clone)]
pub struct Coalescer {
    inner: Arc<Inner>,
}

struct Inner {
    throttle: AtomicThrottle,
    delay: Duration,
    runner: Arc<dyn CycleRunner>,
    diagnostics: Diagnostics,
    handle: Handle,
    completed: AtomicU64,
    idle: Notify,
}

/// Returns the throttle to `Idle` when the scheduled task goes away, whether
/// the cycle finished, failed, panicked or the task was dropped unpolled.
struct ReleaseOnDrop(Arc<Inner>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.throttle.release();
        self.0.idle.notify_waiters();
    }
}

impl Coalescer {
    /// Creates a coalescer that schedules its cycles on the current tokio runtime.
    pub fn new(
        delay: Duration,
        runner: Arc<dyn CycleRunner>,
        diagnostics: Diagnostics,
    ) -> Result<Self, CoalescerError> {
        let handle = Handle::try_current().map_err(|_| CoalescerError::NoRuntime)?;
        Ok(Self::with_handle(handle, delay, runner, diagnostics))
    }

    /// Creates a coalescer bound to an explicit runtime, so that `signal()` can be
    /// called from threads the runtime does not own.
    pub fn with_handle(
        handle: Handle,
        delay: Duration,
        runner: Arc<dyn CycleRunner>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                throttle: AtomicThrottle::default(),
                delay,
                runner,
                diagnostics,
                handle,
                completed: AtomicU64::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Requests a cycle.
    ///
    /// Returns `true` if this call scheduled one to run after the configured
    /// delay. While a cycle is already scheduled or running the call does
    /// nothing and returns `false`; that cycle reads state when it runs.
    pub fn signal(&self) -> bool {
        self.schedule(self.inner.delay)
    }

    /// Like [`signal`](Self::signal), but the claimed cycle starts immediately.
    pub fn flush(&self) -> bool {
        self.schedule(Duration::ZERO)
    }

    pub fn state(&self) -> ThrottleState {
        self.inner.throttle.load()
    }

    /// Number of cycle bodies that have run to an outcome, successful or not.
    pub fn completed_cycles(&self) -> u64 {
        self.inner.completed.load(Ordering::Acquire)
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Resolves once no cycle is scheduled or running.
    ///
    /// Producers may schedule a new cycle right after this returns.
    pub async fn wait_idle(&self) {
        loop {
            let mut notified = std::pin::pin!(self.inner.idle.notified());
            notified.as_mut().enable();
            if self.state() == ThrottleState::Idle {
                return;
            }
            notified.await;
        }
    }

    fn schedule(&self, delay: Duration) -> bool {
        if !self.inner.throttle.try_claim() {
            tracing::trace!(state = %self.state(), "Signal absorbed by pending cycle.");
            return false;
        }

        // The window is measured from the claiming signal, not from when the
        // task first gets polled.
        let deadline = Instant::now() + delay;
        let release = ReleaseOnDrop(Arc::clone(&self.inner));
        let inner = Arc::clone(&self.inner);

        self.inner.handle.spawn(async move {
            let _release = release;
            tokio::time::sleep_until(deadline).await;
            inner.throttle.mark_running();
            inner.run_cycle().await;
        });

        tracing::trace!(delay_ms = delay.as_millis() as u64, "Cycle scheduled.");
        true
    }
}

impl Inner {
    async fn run_cycle(&self) {
        let outcome = AssertUnwindSafe(self.runner.run_cycle()).catch_unwind().await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.diagnostics
                    .error(&format!("{}: {:#}", CYCLE_FAILURE_PREFIX, e));
            }
            Err(payload) => {
                self.diagnostics
                    .error(&format!("{}: {}", CYCLE_FAILURE_PREFIX, panic_message(payload.as_ref())));
            }
        }

        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(completed, "Cycle finished.");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "cycle panicked".to_string()
    }
}

impl fmt::Debug for Coalescer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coalescer")
            .field("state", &self.state())
            .field("delay", &self.inner.delay)
            .field("completed_cycles", &self.completed_cycles())
            .finish()
    }
}
