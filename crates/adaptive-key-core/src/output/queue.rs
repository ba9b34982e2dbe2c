// Adaptive Key Behavior Queue
// Timed FIFO executor: queued actions run on a worker thread with explicit delays

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::binding::Binding;
use crate::output::executor::ActionExecutor;

#[derive(Debug, Clone)]
struct QueuedAction {
    binding: Binding,
    pressed: bool,
    delay_ms: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<QueuedAction>,
    /// An action popped by the worker is running or its delay is elapsing
    busy: bool,
    shutdown: bool,
}

struct QueueShared<E> {
    executor: Mutex<E>,
    state: Mutex<QueueState>,
    changed: Condvar,
}

/// Wraps an executor so that `enqueue` is serviced asynchronously.
///
/// Enqueued actions are invoked in FIFO order by a worker thread, which sleeps
/// for each action's delay before starting the next one. `invoke` reaches the
/// wrapped executor right away only when nothing is queued or running. Dropping the queue drains
/// what is pending and joins the worker.
pub struct BehaviorQueue<E: ActionExecutor + Send + 'static> {
    shared: Arc<QueueShared<E>>,
    worker: Option<JoinHandle<()>>,
}

impl<E: ActionExecutor + Send + 'static> BehaviorQueue<E> {
    /// Start the worker thread around `executor`
    pub fn new(executor: E) -> io::Result<Self> {
        let shared = Arc::new(QueueShared {
            executor: Mutex::new(executor),
            state: Mutex::new(QueueState::default()),
            changed: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("adaptive-key-queue".to_string())
            .spawn(move || run_worker(&worker_shared))?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Number of actions not yet started
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Block until every queued action has run and its delay elapsed
    pub fn flush(&self) {
        let mut state = self.shared.state.lock();
        while !state.pending.is_empty() || state.busy {
            self.shared.changed.wait(&mut state);
        }
    }

    /// Run `f` with exclusive access to the wrapped executor
    pub fn with_executor<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        let mut executor = self.shared.executor.lock();
        f(&mut executor)
    }
}

fn run_worker<E: ActionExecutor>(shared: &QueueShared<E>) {
    loop {
        let action = {
            let mut state = shared.state.lock();
            loop {
                if let Some(action) = state.pending.pop_front() {
                    state.busy = true;
                    break action;
                }
                if state.shutdown {
                    return;
                }
                shared.changed.wait(&mut state);
            }
        };

        log::trace!(
            "Queue running {} {}",
            action.binding,
            if action.pressed { "press" } else { "release" }
        );
        shared
            .executor
            .lock()
            .invoke(&action.binding, action.pressed);

        if action.delay_ms > 0 {
            thread::sleep(Duration::from_millis(u64::from(action.delay_ms)));
        }

        let mut state = shared.state.lock();
        state.busy = false;
        shared.changed.notify_all();
    }
}

impl<E: ActionExecutor + Send + 'static> ActionExecutor for BehaviorQueue<E> {
    /// Runs right away when the queue is idle, otherwise joins the FIFO
    /// behind the actions already queued.
    fn invoke(&mut self, binding: &Binding, pressed: bool) {
        let mut state = self.shared.state.lock();
        if state.pending.is_empty() && !state.busy {
            self.shared.executor.lock().invoke(binding, pressed);
            return;
        }
        log::trace!("Deferring {} behind {} queued action(s)", binding, state.pending.len());
        state.pending.push_back(QueuedAction {
            binding: binding.clone(),
            pressed,
            delay_ms: 0,
        });
        self.shared.changed.notify_all();
    }

    fn enqueue(&mut self, binding: &Binding, pressed: bool, delay_ms: u32) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            log::warn!("Dropping {} queued after shutdown", binding);
            return;
        }
        state.pending.push_back(QueuedAction {
            binding: binding.clone(),
            pressed,
            delay_ms,
        });
        self.shared.changed.notify_all();
    }
}

impl<E: ActionExecutor + Send + 'static> Drop for BehaviorQueue<E> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.changed.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Behavior queue worker panicked");
            }
        }
    }
}
