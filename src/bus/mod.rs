//! Typed pub/sub over bounded queues, keyed by [`Origin`].
//!
//! A publisher calls [`Bus::publish`] with an [`Origin`] and an [`Event`];
//! the bus copies the event into every queue currently subscribed to that
//! origin. Delivery is at-most-once per subscription and preserves
//! per-publisher ordering within an origin; cross-origin ordering is not
//! guaranteed (§5 of the design spec).

mod event;
mod origin;

pub use event::{Event, PlayMode};
pub use origin::Origin;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};

/// Default bounded capacity for a worker's queue, matching the embedded
/// original's `YSW_TASK_DEFAULT_QUEUE_SIZE`.
pub const DEFAULT_QUEUE_SIZE: usize = 16;

/// How long [`Bus::publish`] will block trying to deliver to a full queue
/// before giving up on that one subscriber and recording an overflow.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(50);

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// A subscriber's handle, carried by the bus's internal subscriber lists.
///
/// Cloning a `Queue` clones the underlying sender (cheap, as with any MPSC
/// channel handle); the `id` is what `unsubscribe`/`delete_queue` match on,
/// since channel senders have no meaningful equality of their own.
#[derive(Clone)]
pub struct Queue {
    id: u64,
    sender: Sender<Event>,
}

impl Queue {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Receiving half of a queue created by [`channel`]. Thin wrapper so worker
/// code reads `QueueReceiver` rather than the bus's channel crate directly.
pub struct QueueReceiver(Receiver<Event>);

impl QueueReceiver {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.0.recv_timeout(timeout)
    }

    pub fn recv(&self) -> Result<Event, crossbeam_channel::RecvError> {
        self.0.recv()
    }
}

/// Create a bounded queue: a [`Queue`] handle to hand to [`Bus::subscribe`]
/// and a [`QueueReceiver`] for the worker that owns it.
pub fn channel(capacity: usize) -> (Queue, QueueReceiver) {
    let (sender, receiver) = bounded(capacity);
    let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
    (Queue { id, sender }, QueueReceiver(receiver))
}

/// Result of a single [`Bus::publish`] call: how many subscribers received
/// the event and how many were dropped because their queue stayed full past
/// the send timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
}

struct Subscribers {
    by_origin: [Vec<Queue>; Origin::ALL.len()],
}

impl Subscribers {
    fn new() -> Self {
        Self {
            by_origin: Default::default(),
        }
    }
}

/// Copies each published event into every queue subscribed to its origin.
pub struct Bus {
    subscribers: Mutex<Subscribers>,
    send_timeout: Duration,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self::with_send_timeout(DEFAULT_SEND_TIMEOUT)
    }

    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            subscribers: Mutex::new(Subscribers::new()),
            send_timeout,
        }
    }

    /// Subscribe `queue` to events published on `origin`.
    pub fn subscribe(&self, origin: Origin, queue: Queue) {
        let mut subs = self.subscribers.lock().expect("bus lock poisoned");
        let list = &mut subs.by_origin[origin.index()];
        if !list.iter().any(|q| *q == queue) {
            list.push(queue);
        }
    }

    /// Remove `queue` from `origin`'s subscriber list.
    pub fn unsubscribe(&self, origin: Origin, queue: &Queue) {
        let mut subs = self.subscribers.lock().expect("bus lock poisoned");
        subs.by_origin[origin.index()].retain(|q| q != queue);
    }

    /// Remove `queue` from every origin's subscriber list.
    pub fn delete_queue(&self, queue: &Queue) {
        let mut subs = self.subscribers.lock().expect("bus lock poisoned");
        for list in &mut subs.by_origin {
            list.retain(|q| q != queue);
        }
    }

    /// Publish `event` to every subscriber of `origin`. Each subscriber gets
    /// its own clone; a full queue blocks up to `send_timeout` before the
    /// event is dropped for that subscriber only (recorded as an overflow,
    /// not a publish failure — the other subscribers are unaffected).
    pub fn publish(&self, origin: Origin, event: Event) -> PublishReport {
        // Snapshot the subscriber list so we don't hold the bus lock while
        // potentially blocking on a subscriber's queue.
        let snapshot: Vec<Queue> = {
            let subs = self.subscribers.lock().expect("bus lock poisoned");
            subs.by_origin[origin.index()].clone()
        };

        let mut report = PublishReport::default();
        for queue in &snapshot {
            match queue.sender.send_timeout(event.clone(), self.send_timeout) {
                Ok(()) => report.delivered += 1,
                Err(SendTimeoutError::Timeout(_)) => {
                    let err = crate::error::EngineError::QueueOverflow {
                        origin,
                        queue_id: queue.id(),
                    };
                    log::warn!("{err}");
                    report.dropped += 1;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    // Subscriber's worker is gone; nothing to deliver to.
                }
            }
        }
        report
    }
}
