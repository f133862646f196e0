use std::cell::Cell;
use std::rc::Rc;

/// Refresh cadence for incidents and dashboard metrics.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 30_000;

/// Monotonic request-sequence guard.
///
/// In-flight HTTP requests are not cancelable in this design, so a response
/// can land after a newer one has already been applied — overlapping polls
/// are issued without mutual exclusion. Each fetch takes a ticket with
/// `begin()` and may only write its result back if `try_commit` accepts it,
/// which rejects any response older than the newest committed one.
#[derive(Clone, Default)]
pub struct RequestSequence {
    next: Rc<Cell<u64>>,
    committed: Rc<Cell<u64>>,
}

impl RequestSequence {
    pub fn begin(&self) -> u64 {
        let ticket = self.next.get() + 1;
        self.next.set(ticket);
        ticket
    }

    pub fn try_commit(&self, ticket: u64) -> bool {
        if ticket <= self.committed.get() {
            return false;
        }
        self.committed.set(ticket);
        true
    }
}

/// Repeating fetch trigger with a cancellation handle.
///
/// The owning UI scope must keep the handle alive and drop it on teardown
/// (`on_cleanup`); a leaked handle is a dangling timer firing fetches
/// against an unmounted consumer. Ticks that overlap an in-flight fetch are
/// issued anyway — cache writes are idempotent replacements, so the only
/// cost is wasted work.
pub struct Poller {
    cancelled: Rc<Cell<bool>>,
    #[cfg(target_arch = "wasm32")]
    interval: Option<gloo_timers::callback::Interval>,
}

impl Poller {
    pub fn start<F>(interval_ms: u32, tick: F) -> Self
    where
        F: Fn() + 'static,
    {
        let cancelled = Rc::new(Cell::new(false));

        #[cfg(target_arch = "wasm32")]
        let interval = {
            let cancelled = cancelled.clone();
            Some(gloo_timers::callback::Interval::new(interval_ms, move || {
                if !cancelled.get() {
                    tick();
                }
            }))
        };
        #[cfg(not(target_arch = "wasm32"))]
        let _ = (interval_ms, &tick);

        Self {
            cancelled,
            #[cfg(target_arch = "wasm32")]
            interval,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled.set(true);
        #[cfg(target_arch = "wasm32")]
        {
            self.interval.take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}
