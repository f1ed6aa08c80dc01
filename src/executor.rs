//! A single-thread, time-ordered task scheduler used by the pool to drive its ping and
//! cleanup maintenance cycles.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Whether a submitted task runs exactly once or is rescheduled at a fixed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    RunOnce,
    RunAtInterval,
}

type BoxedTask = Box<dyn FnMut() + Send + 'static>;

struct TaskEntry {
    task: BoxedTask,
    kind: TaskKind,
    interval: Duration,
}

/// Tasks are ordered by `(wake_at, sequence)`; the sequence number breaks ties between tasks
/// scheduled for the exact same instant in submission order, per the executor's ordering
/// guarantee.
type WakeKey = (Instant, u64);

struct State {
    tasks: BTreeMap<WakeKey, TaskEntry>,
    stopped: bool,
    next_seq: u64,
}

struct Shared {
    state: Mutex<State>,
    cv: Condvar,
}

/// A single worker thread draining a time-ordered task queue.
///
/// Maintenance work is infrequent and coarse-grained, and the tasks submitted here (pool ping,
/// pool cleanup) already need to serialise with the pool's own mutex — a single thread avoids
/// any need for per-task locking on top of that.
pub struct EventLoopExecutor {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl EventLoopExecutor {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State { tasks: BTreeMap::new(), stopped: false, next_seq: 0 }),
            cv: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("nvql-event-loop".into())
            .spawn(move || run_loop(worker_shared))
            .expect("failed to spawn nvql event loop thread");

        Self { shared, thread: Some(thread) }
    }

    /// Schedules `task` to run at `now + initial_delay`. `RunAtInterval` tasks are
    /// re-enqueued at `fire_time + repeat_interval` after each run.
    pub fn submit<F>(&self, task: F, kind: TaskKind, initial_delay: Duration, repeat_interval: Duration)
    where
        F: FnMut() + Send + 'static,
    {
        let mut state = self.shared.state.lock().unwrap();
        if state.stopped {
            return;
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        let wake_at = Instant::now() + initial_delay;
        state.tasks.insert(
            (wake_at, seq),
            TaskEntry { task: Box::new(task), kind, interval: repeat_interval },
        );
        drop(state);
        self.shared.cv.notify_all();
    }

    /// Stops the worker thread. Idempotent: pending tasks are discarded, a task currently
    /// running completes but is not rescheduled. Safe to call more than once.
    pub fn stop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.stopped {
                return;
            }
            state.stopped = true;
            state.tasks.clear();
        }
        self.shared.cv.notify_all();

        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    fn is_stopped(&self) -> bool {
        self.shared.state.lock().unwrap().stopped
    }
}

impl Default for EventLoopExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventLoopExecutor {
    fn drop(&mut self) {
        if !self.is_stopped() {
            self.stop();
        }
    }
}

fn run_loop(shared: Arc<Shared>) {
    loop {
        let mut due = Vec::new();

        {
            let mut state = shared.state.lock().unwrap();

            loop {
                if state.stopped {
                    return;
                }

                match state.tasks.keys().next().copied() {
                    None => {
                        state = shared.cv.wait(state).unwrap();
                    }
                    Some((wake_at, _)) => {
                        let now = Instant::now();
                        if wake_at <= now {
                            break;
                        }
                        let (new_state, timeout_result) =
                            shared.cv.wait_timeout(state, wake_at - now).unwrap();
                        state = new_state;
                        let _ = timeout_result;
                    }
                }
            }

            let now = Instant::now();
            while let Some((&key, _)) = state.tasks.iter().next() {
                if key.0 > now {
                    break;
                }
                let entry = state.tasks.remove(&key).unwrap();
                due.push(entry);
            }
        }

        for mut entry in due {
            let result = panic::catch_unwind(AssertUnwindSafe(|| (entry.task)()));
            if let Err(payload) = result {
                let message = panic_message(&payload);
                tracing::error!(task.panic = %message, "scheduled task panicked");
            }

            let mut state = shared.state.lock().unwrap();
            if state.stopped {
                return;
            }
            if entry.kind == TaskKind::RunAtInterval {
                let seq = state.next_seq;
                state.next_seq += 1;
                let wake_at = Instant::now() + entry.interval;
                state.tasks.insert((wake_at, seq), entry);
            }
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn run_once_executes_a_single_time() {
        let executor = EventLoopExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        executor.submit(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            TaskKind::RunOnce,
            Duration::from_millis(10),
            Duration::ZERO,
        );

        thread::sleep(Duration::from_millis(150));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_at_interval_reschedules() {
        let executor = EventLoopExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        executor.submit(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            TaskKind::RunAtInterval,
            Duration::from_millis(20),
            Duration::from_millis(20),
        );

        thread::sleep(Duration::from_millis(150));
        assert!(counter.load(Ordering::SeqCst) >= 3, "expected several firings, got {}", counter.load(Ordering::SeqCst));
    }

    #[test]
    fn stop_is_idempotent_and_discards_pending_tasks() {
        let mut executor = EventLoopExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        executor.submit(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            TaskKind::RunOnce,
            Duration::from_secs(30),
            Duration::ZERO,
        );

        executor.stop();
        executor.stop();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn a_panicking_task_does_not_kill_the_loop() {
        let executor = EventLoopExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));

        executor.submit(
            || panic!("boom"),
            TaskKind::RunOnce,
            Duration::from_millis(5),
            Duration::ZERO,
        );

        let c = Arc::clone(&counter);
        executor.submit(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            TaskKind::RunOnce,
            Duration::from_millis(40),
            Duration::ZERO,
        );

        thread::sleep(Duration::from_millis(200));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
