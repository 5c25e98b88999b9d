//! FIFO gate serializing access to the single engine connection.
//!
//! Waiters queue in arrival order. Releasing a lease hands the gate straight to
//! the oldest live waiter instead of unlocking and letting everyone race for it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::trace;

#[derive(Debug, Default)]
struct GateState {
    locked: bool,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Mutual exclusion with an explicit FIFO wait list.
#[derive(Debug, Default)]
pub struct TransactionGate {
    state: Mutex<GateState>,
}

impl TransactionGate {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait for the gate. Resolves immediately when it is free.
    ///
    /// Dropping the returned future before it resolves gives up the place in the
    /// queue; if the gate was already handed to it, it is passed on.
    pub async fn acquire(self: &Arc<Self>) -> GateLease {
        let receiver = {
            let mut state = self.lock_state();
            if !state.locked {
                state.locked = true;
                return GateLease::new(Arc::clone(self));
            }
            let (sender, receiver) = oneshot::channel();
            state.waiters.push_back(sender);
            trace!(queued = state.waiters.len(), "transaction gate busy, waiting");
            receiver
        };

        let mut pending = PendingAcquire {
            gate: Arc::clone(self),
            receiver: Some(receiver),
        };
        if let Some(receiver) = pending.receiver.as_mut() {
            // Senders only leave the queue by being sent to, so a receive error
            // cannot occur while we hold an Arc to the gate.
            let _ = receiver.await;
        }
        pending.receiver = None;
        GateLease::new(Arc::clone(self))
    }

    /// Whether some lease currently holds the gate.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_state().locked
    }

    /// Number of queued waiters.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.lock_state().waiters.len()
    }

    /// Pass the gate to the next live waiter or mark it free.
    fn hand_off(&self) {
        let mut state = self.lock_state();
        while let Some(next) = state.waiters.pop_front() {
            if next.send(()).is_ok() {
                trace!(remaining = state.waiters.len(), "transaction gate handed off");
                return;
            }
        }
        state.locked = false;
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        // No code panics while holding this lock, but recover rather than
        // propagating a poison.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Proof of holding the gate. Released explicitly or on drop, exactly once.
#[derive(Debug)]
pub struct GateLease {
    gate: Arc<TransactionGate>,
    released: AtomicBool,
}

impl GateLease {
    fn new(gate: Arc<TransactionGate>) -> Self {
        Self {
            gate,
            released: AtomicBool::new(false),
        }
    }

    /// Release the gate. Later calls are no-ops.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.gate.hand_off();
        }
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for GateLease {
    fn drop(&mut self) {
        self.release();
    }
}

struct PendingAcquire {
    gate: Arc<TransactionGate>,
    receiver: Option<oneshot::Receiver<()>>,
}

impl Drop for PendingAcquire {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
            if receiver.try_recv().is_ok() {
                // Handed the gate after cancellation; pass it on.
                self.gate.hand_off();
            }
        }
    }
}
