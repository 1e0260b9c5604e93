use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where the coalescer is in its single-cycle lifecycle.
///
/// `Idle -> Scheduled` happens in `signal()`, `Scheduled -> Running` when the
/// delay elapses, and `Running -> Idle` once the cycle body has finished,
/// whatever its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThrottleState {
    Idle = 0,
    Scheduled = 1,
    Running = 2,
}

impl ThrottleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ThrottleState::Scheduled,
            2 => ThrottleState::Running,
            _ => ThrottleState::Idle,
        }
    }
}

impl fmt::Display for ThrottleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The one piece of shared state every producer touches.
#[derive(Debug, Default)]
pub(crate) struct AtomicThrottle(AtomicU8);

impl AtomicThrottle {
    pub(crate) fn load(&self) -> ThrottleState {
        ThrottleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Claims `Idle -> Scheduled`. Exactly one of any number of racing callers wins.
    pub(crate) fn try_claim(&self) -> bool {
        self.0
            .compare_exchange(
                ThrottleState::Idle as u8,
                ThrottleState::Scheduled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn mark_running(&self) {
        self.0.store(ThrottleState::Running as u8, Ordering::Release);
    }

    pub(crate) fn release(&self) {
        self.0.store(ThrottleState::Idle as u8, Ordering::Release);
    }
}
