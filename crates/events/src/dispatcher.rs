//! Handler scheduling strategies.
//!
//! The broadcaster never calls a handler itself. Each invocation is packaged
//! as a [`Delivery`] and handed to the configured [`EventDispatcher`], which
//! decides where and when it runs. Whatever the policy, `dispatch` returns
//! only after the handler has finished (or the delivery was dropped), so a
//! broadcast pass stays synchronous for its caller.
//!
//! ```text
//! Broadcaster::broadcast
//!   ↓ (snapshot, subscription order)
//! Delivery { tag, subscriber_id, job }
//!   ↓
//! EventDispatcher::dispatch
//!   ├─ InlineDispatcher      → run on the calling thread
//!   ├─ QueueDispatcher       → run on one serial worker thread, caller waits
//!   ├─ KeyedQueueDispatcher  → one serial worker per tag, caller waits
//!   └─ MutedDispatcher       → dropped, handler never runs
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::trace;

use herald_core::SubscriberId;

use crate::error::{DispatchError, HandlerResult};
use crate::event::EventTag;

type Job = Box<dyn FnOnce() -> HandlerResult + Send + 'static>;

/// One pending handler invocation, with the event already bound.
pub struct Delivery {
    tag: EventTag,
    subscriber_id: SubscriberId,
    job: Job,
}

impl Delivery {
    pub fn new<F>(tag: EventTag, subscriber_id: SubscriberId, job: F) -> Self
    where
        F: FnOnce() -> HandlerResult + Send + 'static,
    {
        Self {
            tag,
            subscriber_id,
            job: Box::new(job),
        }
    }

    pub fn tag(&self) -> &EventTag {
        &self.tag
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    /// Invoke the handler on the current thread.
    ///
    /// A panic inside the handler is caught and reported as
    /// [`DispatchError::Handler`], exactly like a returned error.
    pub fn run(self) -> Result<(), DispatchError> {
        let job = self.job;
        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(result) => result.map_err(DispatchError::Handler),
            Err(payload) => Err(DispatchError::Handler(anyhow!(
                "handler panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("tag", &self.tag)
            .field("subscriber_id", &self.subscriber_id)
            .finish_non_exhaustive()
    }
}

/// Strategy deciding how a single handler invocation is executed.
///
/// ## Contract
///
/// - `dispatch` blocks until the handler has completed, even if it runs on
///   another thread.
/// - A handler failure must come back as [`DispatchError::Handler`]; it is
///   never swallowed. Running jobs through [`Delivery::run`] guarantees this
///   for panics too.
/// - Dropping the delivery without running it is legitimate (see
///   [`MutedDispatcher`]).
///
/// ## Thread Safety
///
/// Dispatchers are shared between broadcasters and called from any thread,
/// hence `Send + Sync`.
pub trait EventDispatcher: Send + Sync + fmt::Debug {
    fn dispatch(&self, delivery: Delivery) -> Result<(), DispatchError>;
}

impl<D> EventDispatcher for Arc<D>
where
    D: EventDispatcher + ?Sized,
{
    fn dispatch(&self, delivery: Delivery) -> Result<(), DispatchError> {
        (**self).dispatch(delivery)
    }
}

/// Runs every handler directly on the broadcasting thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl EventDispatcher for InlineDispatcher {
    fn dispatch(&self, delivery: Delivery) -> Result<(), DispatchError> {
        delivery.run()
    }
}

/// Drops every delivery. Subscribers stay registered but are never called.
#[derive(Debug, Default, Clone, Copy)]
pub struct MutedDispatcher;

impl EventDispatcher for MutedDispatcher {
    fn dispatch(&self, delivery: Delivery) -> Result<(), DispatchError> {
        trace!(
            tag = %delivery.tag(),
            subscriber_id = %delivery.subscriber_id(),
            "delivery muted"
        );
        Ok(())
    }
}
