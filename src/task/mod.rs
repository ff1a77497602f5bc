//! A worker is a single thread bound to one bus queue. It runs an
//! initializer once, then loops: wait on its queue with a timeout the
//! handler controls, and invoke the handler with `Some(event)` or `None`
//! (on timeout) — letting the handler drive its own soft scheduler by
//! returning the next wait.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::bus::{channel, Bus, Event, Origin, Queue};

/// `None` means wait forever (the worker's handler has nothing further
/// scheduled); `Some(d)` wakes the worker after `d` even without an event.
pub type NextWait = Option<Duration>;

/// Configuration for [`spawn`].
pub struct WorkerConfig<H> {
    pub name: String,
    pub queue_size: usize,
    pub initial_wait: NextWait,
    /// Run once on the worker thread, before the first wait, and nowhere
    /// else — the place for per-thread setup (e.g. pinning, thread-local
    /// init) that must happen on the worker's own thread rather than the
    /// spawner's.
    pub initializer: Option<Box<dyn FnOnce() + Send>>,
    pub handler: H,
}

impl<H> WorkerConfig<H> {
    pub fn new(name: impl Into<String>, handler: H) -> Self {
        Self {
            name: name.into(),
            queue_size: crate::bus::DEFAULT_QUEUE_SIZE,
            initial_wait: None,
            initializer: None,
            handler,
        }
    }
}

/// A running worker: its queue handle (for subscribing on a [`Bus`]) and its
/// `JoinHandle`. Dropping this does not stop the thread; publish [`Event`]s
/// that make the handler return and exit, or rely on process shutdown.
pub struct Worker {
    pub queue: Queue,
    pub join_handle: JoinHandle<()>,
}

/// Spawn a worker thread bound to a fresh bounded queue.
///
/// `handler(event) -> NextWait` is invoked once per loop iteration: with
/// `Some(event)` when one arrived, or `None` when the wait timed out. The
/// returned `NextWait` becomes the timeout for the following iteration.
pub fn spawn<H>(config: WorkerConfig<H>) -> Worker
where
    H: FnMut(Option<Event>) -> NextWait + Send + 'static,
{
    let (queue, receiver) = channel(config.queue_size);
    let name = config.name;
    let mut handler = config.handler;
    let mut wait = config.initial_wait;
    let initializer = config.initializer;

    let join_handle = thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            if let Some(initializer) = initializer {
                initializer();
            }

            loop {
                let event = match wait {
                    Some(timeout) => match receiver.recv_timeout(timeout) {
                        Ok(event) => Some(event),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => {
                            log::debug!("worker {name}: queue disconnected, exiting");
                            return;
                        }
                    },
                    None => match receiver.recv() {
                        Ok(event) => Some(event),
                        Err(_) => {
                            log::debug!("worker {name}: queue disconnected, exiting");
                            return;
                        }
                    },
                };
                wait = handler(event);
            }
        })
        .expect("failed to spawn worker thread");

    Worker { queue, join_handle }
}

/// Convenience: subscribe a worker's queue to a bus origin.
pub fn subscribe(bus: &Bus, worker: &Worker, origin: Origin) {
    bus.subscribe(origin, worker.queue.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn handler_receives_events_and_timeouts() {
        let bus = Arc::new(Bus::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let timeouts = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let timeouts2 = timeouts.clone();

        let worker = spawn(WorkerConfig {
            name: "test-worker".into(),
            queue_size: 4,
            initial_wait: Some(Duration::from_millis(10)),
            initializer: None,
            handler: move |event: Option<Event>| {
                match event {
                    Some(Event::Stop) => {
                        hits2.fetch_add(1, Ordering::SeqCst);
                    }
                    None => {
                        timeouts2.fetch_add(1, Ordering::SeqCst);
                    }
                    _ => {}
                }
                Some(Duration::from_millis(5))
            },
        });
        subscribe(&bus, &worker, Origin::Command);

        bus.publish(Origin::Command, Event::Stop);
        thread::sleep(Duration::from_millis(60));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(timeouts.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn initializer_runs_once_before_the_first_wait() {
        let init_count = Arc::new(AtomicUsize::new(0));
        let seen_uninitialized = Arc::new(AtomicUsize::new(0));
        let for_init = init_count.clone();
        let for_handler = init_count.clone();
        let seen_uninitialized2 = seen_uninitialized.clone();

        let worker = spawn(WorkerConfig {
            name: "init-worker".into(),
            queue_size: 4,
            initial_wait: Some(Duration::from_millis(5)),
            initializer: Some(Box::new(move || {
                for_init.fetch_add(1, Ordering::SeqCst);
            })),
            handler: move |_event: Option<Event>| {
                if for_handler.load(Ordering::SeqCst) == 0 {
                    seen_uninitialized2.fetch_add(1, Ordering::SeqCst);
                }
                Some(Duration::from_millis(5))
            },
        });

        thread::sleep(Duration::from_millis(40));
        drop(worker.queue);
        let _ = worker.join_handle.join();

        assert_eq!(init_count.load(Ordering::SeqCst), 1, "initializer must run exactly once");
        assert_eq!(seen_uninitialized.load(Ordering::SeqCst), 0, "handler must never run before the initializer");
    }
}
