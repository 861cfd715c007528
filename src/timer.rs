//! One-shot timers that report expiry as events.
//!
//! Nothing here touches menu state. An expired timer only sends
//! `Event::Timer(key)` down the channel the control loop reads from, and the
//! consumer decides whether to arm it again.

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::event::{Event, TimerKey};

pub trait Timers {
    /// Schedules `key` to fire once after `after`, replacing any pending instance.
    fn arm(&mut self, key: TimerKey, after: Duration);

    /// Drops a pending `key`. Cancelling an idle key does nothing.
    fn cancel(&mut self, key: TimerKey);

    fn cancel_all(&mut self);
}

/// Timer change requested by the input decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    Arm { key: TimerKey, after: Duration },
    Cancel(TimerKey),
}

impl TimerRequest {
    pub fn apply(self, timers: &mut dyn Timers) {
        match self {
            TimerRequest::Arm { key, after } => timers.arm(key, after),
            TimerRequest::Cancel(key) => timers.cancel(key),
        }
    }
}

#[derive(Default)]
struct State {
    pending: HashMap<TimerKey, Instant>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background thread holding every pending deadline.
pub struct Scheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn spawn(tx: Sender<Event>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
        });
        let worker_shared = shared.clone();
        let worker = thread::spawn(move || run_worker(&worker_shared, &tx));
        Scheduler {
            shared,
            worker: Some(worker),
        }
    }

    fn update(&self, f: impl FnOnce(&mut State)) {
        let mut state = self.shared.lock();
        f(&mut state);
        drop(state);
        self.shared.wake.notify_one();
    }
}

fn run_worker(shared: &Shared, tx: &Sender<Event>) {
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            return;
        }

        let now = Instant::now();
        let due: Vec<TimerKey> = state
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| *key)
            .collect();
        for key in due {
            state.pending.remove(&key);
            if tx.send(Event::Timer(key)).is_err() {
                // the control loop is gone
                return;
            }
        }

        let next = state.pending.values().min().copied();
        state = match next {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(now);
                shared
                    .wake
                    .wait_timeout(state, wait)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner),
        };
    }
}

impl Timers for Scheduler {
    fn arm(&mut self, key: TimerKey, after: Duration) {
        let deadline = Instant::now() + after;
        self.update(|s| {
            s.pending.insert(key, deadline);
        });
    }

    fn cancel(&mut self, key: TimerKey) {
        self.update(|s| {
            s.pending.remove(&key);
        });
    }

    fn cancel_all(&mut self) {
        self.update(|s| s.pending.clear());
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.update(|s| s.shutdown = true);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
