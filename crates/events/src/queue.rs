//! Serial dispatch queues backed by dedicated worker threads.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, mpsc};
use std::thread::{self, ThreadId};

use tracing::{debug, info, trace};

use crate::dispatcher::{Delivery, EventDispatcher};
use crate::error::DispatchError;
use crate::event::EventTag;

/// Queue dispatcher configuration.
#[derive(Debug, Clone)]
pub struct QueueDispatcherConfig {
    /// Name of the worker thread (also used in logs).
    pub thread_name: String,
}

impl Default for QueueDispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: "herald-dispatch".to_string(),
        }
    }
}

impl QueueDispatcherConfig {
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

struct Queued {
    delivery: Delivery,
    reply: mpsc::SyncSender<Result<(), DispatchError>>,
}

/// Runs deliveries one at a time on a single worker thread.
///
/// `dispatch` enqueues the delivery and blocks the caller until the worker has
/// run it, so every handler dispatched through the same instance executes
/// strictly one after another, whichever thread broadcast the event.
///
/// ## Re-entrancy
///
/// A handler that broadcasts through a broadcaster sharing this queue is
/// already on the worker thread; such nested deliveries run inline instead of
/// waiting on themselves.
///
/// ## Panics
///
/// A panicking handler is caught by [`Delivery::run`] on the worker and
/// reported as [`DispatchError::Handler`]; the queue keeps serving later
/// deliveries.
///
/// ## Lifecycle
///
/// The worker stops once the dispatcher is dropped. The process-wide default
/// returned by [`QueueDispatcher::shared`] is never dropped.
pub struct QueueDispatcher {
    name: String,
    sender: mpsc::Sender<Queued>,
    worker: ThreadId,
}

impl QueueDispatcher {
    /// Start a new queue with its own worker thread.
    ///
    /// NUL bytes are not allowed in OS thread names; they are replaced with
    /// `?` in the worker's name.
    pub fn spawn(config: QueueDispatcherConfig) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Queued>();
        let name = config.thread_name.replace('\0', "?");

        let worker_name = name.clone();
        let join = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(&worker_name, receiver))?;
        let worker = join.thread().id();

        Ok(Self {
            name,
            sender,
            worker,
        })
    }

    /// The process-wide default queue, started on first use.
    ///
    /// This is the dispatcher `BroadcasterConfig::default()` injects. Every
    /// broadcaster holding it shares one serial execution context.
    pub fn shared() -> Arc<QueueDispatcher> {
        static SHARED: OnceLock<Arc<QueueDispatcher>> = OnceLock::new();

        SHARED
            .get_or_init(|| {
                let config = QueueDispatcherConfig::default().with_thread_name("herald-shared");
                Arc::new(Self::spawn(config).expect("failed to spawn shared dispatch thread"))
            })
            .clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn on_worker_thread(&self) -> bool {
        thread::current().id() == self.worker
    }
}

impl fmt::Debug for QueueDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueDispatcher")
            .field("name", &self.name)
            .field("worker", &self.worker)
            .finish()
    }
}

impl EventDispatcher for QueueDispatcher {
    fn dispatch(&self, delivery: Delivery) -> Result<(), DispatchError> {
        if self.on_worker_thread() {
            trace!(queue = %self.name, tag = %delivery.tag(), "nested delivery runs inline");
            return delivery.run();
        }

        let (reply, response) = mpsc::sync_channel(1);
        self.sender
            .send(Queued { delivery, reply })
            .map_err(|_| DispatchError::Closed)?;

        response.recv().map_err(|_| DispatchError::Closed)?
    }
}

fn worker_loop(name: &str, receiver: mpsc::Receiver<Queued>) {
    info!(queue = %name, "dispatch queue started");

    for Queued { delivery, reply } in receiver {
        let tag = delivery.tag().clone();
        let subscriber_id = delivery.subscriber_id();

        let result = delivery.run();
        if let Err(e) = &result {
            debug!(queue = %name, %tag, %subscriber_id, error = %e, "delivery failed");
        }

        // The broadcaster waits on this reply; if it is gone there is no one to tell.
        let _ = reply.send(result);
    }

    info!(queue = %name, "dispatch queue stopped");
}

/// One serial queue per event tag.
///
/// Deliveries for the same tag are serialised; different tags run on their
/// own workers and may proceed in parallel. Queues are started lazily the
/// first time a tag is dispatched and live as long as this dispatcher.
#[derive(Debug)]
pub struct KeyedQueueDispatcher {
    prefix: String,
    queues: Mutex<HashMap<EventTag, Arc<QueueDispatcher>>>,
}

impl KeyedQueueDispatcher {
    pub fn new() -> Self {
        Self::with_prefix("herald-tag")
    }

    /// Worker threads are named `<prefix>:<tag>`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Number of per-tag queues started so far.
    pub fn queue_count(&self) -> usize {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn queue_for(&self, tag: &EventTag) -> Result<Arc<QueueDispatcher>, DispatchError> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(queue) = queues.get(tag) {
            return Ok(Arc::clone(queue));
        }

        let config =
            QueueDispatcherConfig::default().with_thread_name(format!("{}:{}", self.prefix, tag));
        let queue = Arc::new(QueueDispatcher::spawn(config)?);
        queues.insert(tag.clone(), Arc::clone(&queue));
        Ok(queue)
    }
}

impl Default for KeyedQueueDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher for KeyedQueueDispatcher {
    fn dispatch(&self, delivery: Delivery) -> Result<(), DispatchError> {
        let queue = self.queue_for(delivery.tag())?;
        queue.dispatch(delivery)
    }
}
