//! One-shot timers for transient status expiry
//!
//! The session owns at most one pending timer. It cancels and reschedules on
//! every new status and cancels on shutdown.
//!
//! | Scheduler | Runtime |
//! |-----------|---------|
//! | [`ManualScheduler`] | virtual time, advanced explicitly (tests, replay) |
//! | [`TokioScheduler`] | tasks on its own `LocalSet`, driven by [`TokioScheduler::run_until`] (`native`) |
//! | `BrowserScheduler` | `window.setTimeout` (`wasm`) |

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    /// Run `task` once after `delay` unless the returned handle is cancelled.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Cancellation handle. Dropping it does NOT cancel the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

// =============================================================================
// MANUAL SCHEDULER
// =============================================================================

#[derive(Default)]
struct ManualQueue {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<u64, (Duration, Task)>,
}

/// Deterministic scheduler on a virtual clock starting at zero.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    /// Move the clock forward, firing due tasks in deadline order.
    pub fn advance(&self, by: Duration) {
        let target = self.queue.borrow().now + by;
        loop {
            let due = {
                let mut queue = self.queue.borrow_mut();
                let next = queue
                    .pending
                    .iter()
                    .filter(|(_, (deadline, _))| *deadline <= target)
                    .min_by_key(|(id, (deadline, _))| (*deadline, **id))
                    .map(|(id, (deadline, _))| (*id, *deadline));
                match next {
                    Some((id, deadline)) => {
                        queue.now = deadline;
                        queue.pending.remove(&id).map(|(_, task)| task)
                    }
                    None => {
                        queue.now = target;
                        None
                    }
                }
            };
            match due {
                Some(task) => task(),
                None => break,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let id = {
            let mut queue = self.queue.borrow_mut();
            queue.next_id += 1;
            let id = queue.next_id;
            let deadline = queue.now + delay;
            queue.pending.insert(id, (deadline, task));
            id
        };
        let queue: Weak<RefCell<ManualQueue>> = Rc::downgrade(&self.queue);
        TimerHandle::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue.borrow_mut().pending.remove(&id);
            }
        })
    }
}

// =============================================================================
// TOKIO SCHEDULER
// =============================================================================

/// Timers as tasks on a scheduler-owned `LocalSet`.
///
/// Scheduling works from any context, with or without a runtime. Timers only
/// fire while the host drives the set through [`TokioScheduler::run_until`];
/// deadlines are fixed when scheduled, not when first polled.
#[cfg(feature = "native")]
#[derive(Clone, Default)]
pub struct TokioScheduler {
    local: Rc<tokio::task::LocalSet>,
}

#[cfg(feature = "native")]
impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `future` to completion, firing due timers along the way.
    pub async fn run_until<F: std::future::Future>(&self, future: F) -> F::Output {
        self.local.run_until(future).await
    }
}

#[cfg(feature = "native")]
impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let deadline = tokio::time::Instant::now() + delay;
        let handle = self.local.spawn_local(async move {
            tokio::time::sleep_until(deadline).await;
            task();
        });
        TimerHandle::new(move || handle.abort())
    }
}
