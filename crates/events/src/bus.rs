//! Subscription/broadcast abstraction.
//!
//! [`EventBroadcasting`] is the contract a component exposes when it lets
//! others listen to its events. The usual implementation is to hold a
//! [`Broadcaster`](crate::Broadcaster) and delegate to it; the blanket impl for
//! `Arc<B>` lets one broadcaster be shared by several producers.
//!
//! ## Delivery Model
//!
//! - **Synchronous**: `broadcast` returns once every subscriber has run (or one
//!   has failed).
//! - **Ordered**: within one broadcast, subscribers of a tag run in the order
//!   they subscribed.
//! - **Snapshot**: subscribers added or removed while a broadcast is running
//!   (including from inside a handler) do not affect that broadcast.
//! - **Stop on error**: the first failing handler ends the pass and its error is
//!   returned; earlier side effects remain.
//! - **In-process only**: nothing is persisted or sent across processes.
//!
//! ## Usage Pattern
//!
//! ```ignore
//! let bus: Broadcaster<TaggedEvent<u32>> = Broadcaster::new();
//! let id = bus.subscribe("Counter:changed", |ev| {
//!     println!("now {}", ev.payload());
//!     Ok(())
//! });
//!
//! bus.broadcast(TaggedEvent::new("Counter:changed", 3))?;
//! bus.unsubscribe(id, "Counter:changed");
//! ```

use std::sync::Arc;

use herald_core::{OwnerKey, SubscriberId};

use crate::error::{BroadcastError, HandlerResult};
use crate::event::{Event, EventTag};

/// Registered callback, shared between the registry and in-flight broadcasts.
pub type EventHandler<E> = Arc<dyn Fn(&E) -> HandlerResult + Send + Sync>;

/// Publish/subscribe contract for events of type `E`.
///
/// ## Identity
///
/// - `subscribe` returns a [`SubscriberId`] scoped to the tag; keep it to
///   unsubscribe that one handler.
/// - `subscribe_owned` files the handler under an [`OwnerKey`]; one
///   `unsubscribe_owner` call removes everything that owner registered for
///   the tag.
///
/// ## Not Found
///
/// Unknown tags, ids and owners are not errors: the unsubscribe calls simply
/// return `false`, and broadcasting to a tag nobody listens to does nothing.
pub trait EventBroadcasting<E: Event>: Send + Sync {
    /// Register `handler` for `tag` and return its id.
    fn subscribe<F>(&self, tag: impl Into<EventTag>, handler: F) -> SubscriberId
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static;

    /// Register `handler` for `tag` on behalf of `owner`.
    fn subscribe_owned<F>(&self, owner: OwnerKey, tag: impl Into<EventTag>, handler: F)
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static;

    /// Remove the handler registered as `id` under `tag`.
    fn unsubscribe(&self, id: SubscriberId, tag: impl AsRef<str>) -> bool;

    /// Remove every handler `owner` registered under `tag`.
    ///
    /// Returns `true` only if the owner was known and all of its handlers were
    /// still present.
    fn unsubscribe_owner(&self, owner: &OwnerKey, tag: impl AsRef<str>) -> bool;

    /// Deliver `event` to the subscribers of its tag, in subscription order.
    fn broadcast(&self, event: impl Into<Arc<E>>) -> Result<(), BroadcastError>;
}

impl<E, B> EventBroadcasting<E> for Arc<B>
where
    E: Event,
    B: EventBroadcasting<E>,
{
    fn subscribe<F>(&self, tag: impl Into<EventTag>, handler: F) -> SubscriberId
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        (**self).subscribe(tag, handler)
    }

    fn subscribe_owned<F>(&self, owner: OwnerKey, tag: impl Into<EventTag>, handler: F)
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        (**self).subscribe_owned(owner, tag, handler)
    }

    fn unsubscribe(&self, id: SubscriberId, tag: impl AsRef<str>) -> bool {
        (**self).unsubscribe(id, tag)
    }

    fn unsubscribe_owner(&self, owner: &OwnerKey, tag: impl AsRef<str>) -> bool {
        (**self).unsubscribe_owner(owner, tag)
    }

    fn broadcast(&self, event: impl Into<Arc<E>>) -> Result<(), BroadcastError> {
        (**self).broadcast(event)
    }
}
