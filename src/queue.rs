//! Keyed work delivery for the reconcilers
//!
//! Watch events, retries, and the periodic resync all funnel into one queue
//! per reconciler type. Delivery is at-least-once and unordered; the single
//! worker loop gives per-key single-flight execution and a fixed concurrency
//! of one. Immediate deliveries (watch events) arrive over a channel and
//! supersede any scheduled delivery for the same key; scheduled deliveries
//! (resync, retry) sit in a min-heap keyed by due time.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;

/// Namespace/name pair identifying the object a delivery refers to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectKey {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// What the queue should do with a key after a successful reconciliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Next {
    /// Nothing further until another watch event arrives.
    Done,
    /// Redeliver the key after the given interval.
    RequeueAfter(Duration),
}

#[async_trait]
pub trait Reconcile: Send + Sync + 'static {
    async fn reconcile(&self, key: &ObjectKey) -> Result<Next>;
}

pub struct WorkQueue<R> {
    reconciler: R,
    retry_after: Duration,
    rx: UnboundedReceiver<ObjectKey>,
    feed_open: bool,
    due: BinaryHeap<Reverse<(Instant, ObjectKey)>>,
    // Latest schedule per key; heap entries that disagree are stale.
    scheduled: HashMap<ObjectKey, Instant>,
}

impl<R: Reconcile> WorkQueue<R> {
    /// Creates a queue and the sender its watch feed delivers keys through.
    pub fn new(reconciler: R, retry_after: Duration) -> (Self, UnboundedSender<ObjectKey>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = WorkQueue {
            reconciler,
            retry_after,
            rx,
            feed_open: true,
            due: BinaryHeap::new(),
            scheduled: HashMap::new(),
        };
        (queue, tx)
    }

    /// Runs the worker loop until the feed closes and no deliveries remain.
    pub async fn run(mut self) {
        while let Some(key) = self.next_key().await {
            match self.reconciler.reconcile(&key).await {
                Ok(Next::Done) => {}
                Ok(Next::RequeueAfter(after)) => {
                    self.schedule(key, Instant::now() + after);
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "reconcile failed, will retry");
                    self.schedule(key, Instant::now() + self.retry_after);
                }
            }
        }
        debug!("work queue drained, worker exiting");
    }

    async fn next_key(&mut self) -> Option<ObjectKey> {
        loop {
            let next_due = self.peek_due();
            if !self.feed_open && next_due.is_none() {
                return None;
            }
            tokio::select! {
                received = self.rx.recv(), if self.feed_open => match received {
                    Some(key) => {
                        // The immediate delivery supersedes any pending schedule.
                        self.scheduled.remove(&key);
                        return Some(key);
                    }
                    None => self.feed_open = false,
                },
                _ = tokio::time::sleep_until(next_due.unwrap_or_else(Instant::now)),
                    if next_due.is_some() =>
                {
                    if let Some(Reverse((_, key))) = self.due.pop() {
                        self.scheduled.remove(&key);
                        return Some(key);
                    }
                }
            }
        }
    }

    /// Earliest live due time, discarding heap entries superseded by a newer
    /// schedule or an immediate delivery.
    fn peek_due(&mut self) -> Option<Instant> {
        while let Some(Reverse((at, key))) = self.due.peek() {
            if self.scheduled.get(key) == Some(at) {
                return Some(*at);
            }
            self.due.pop();
        }
        None
    }

    fn schedule(&mut self, key: ObjectKey, at: Instant) {
        // An earlier pending delivery for the same key wins.
        if let Some(existing) = self.scheduled.get(&key) {
            if *existing <= at {
                return;
            }
        }
        self.scheduled.insert(key.clone(), at);
        self.due.push(Reverse((at, key)));
    }
}
