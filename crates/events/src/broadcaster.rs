//! Thread-safe broadcaster (the registry + dispatch pipeline).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, error, trace, warn};

use herald_core::{OwnerKey, SubscriberId};

use crate::bus::{EventBroadcasting, EventHandler};
use crate::config::BroadcasterConfig;
use crate::dispatcher::{Delivery, EventDispatcher};
use crate::error::{BroadcastError, DispatchError, HandlerResult};
use crate::event::{Event, EventTag};
use crate::owners::OwnerIndex;
use crate::subscribers::SubscriberTable;

/// Registry state for one tag. Both indexes live behind the same lock so they
/// never disagree from a caller's point of view.
struct Topic<E> {
    subscribers: SubscriberTable<EventHandler<E>>,
    owners: OwnerIndex,
}

impl<E> Default for Topic<E> {
    fn default() -> Self {
        Self {
            subscribers: SubscriberTable::new(),
            owners: OwnerIndex::new(),
        }
    }
}

type SharedTopic<E> = Arc<Mutex<Topic<E>>>;

/// In-process broadcaster for events of type `E`.
///
/// - Topics are created lazily on first subscription and kept for the
///   broadcaster's lifetime, so a tag's id counter never restarts.
/// - Each topic has its own mutex covering add/remove/snapshot.
/// - Handlers always run outside every registry lock; they may subscribe,
///   unsubscribe or broadcast again without deadlocking the registry.
pub struct Broadcaster<E: Event> {
    name: String,
    dispatcher: Arc<dyn EventDispatcher>,
    topics: RwLock<HashMap<EventTag, SharedTopic<E>>>,
}

impl<E: Event> Broadcaster<E> {
    /// Broadcaster on the shared serial queue.
    pub fn new() -> Self {
        Self::with_config(BroadcasterConfig::default())
    }

    pub fn with_config(config: BroadcasterConfig) -> Self {
        Self {
            name: config.name,
            dispatcher: config.dispatcher,
            topics: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatcher(&self) -> &Arc<dyn EventDispatcher> {
        &self.dispatcher
    }

    /// Number of handlers currently subscribed to `tag`.
    pub fn subscriber_count(&self, tag: impl AsRef<str>) -> usize {
        let Some(topic) = self.topic(tag.as_ref()) else {
            return 0;
        };
        let topic = lock(&topic);
        topic.subscribers.len()
    }

    fn topic(&self, tag: &str) -> Option<SharedTopic<E>> {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        topics.get(tag).cloned()
    }

    fn topic_or_insert(&self, tag: &EventTag) -> SharedTopic<E> {
        if let Some(topic) = self.topic(tag.as_str()) {
            return topic;
        }

        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(topics.entry(tag.clone()).or_default())
    }

    fn register(
        &self,
        owner: Option<OwnerKey>,
        tag: EventTag,
        handler: EventHandler<E>,
    ) -> SubscriberId {
        let topic = self.topic_or_insert(&tag);
        let mut topic = lock(&topic);

        let id = topic.subscribers.add(handler);
        if let Some(owner) = owner {
            topic.owners.add(owner, id);
        }

        debug!(
            broadcaster = %self.name,
            %tag,
            subscriber_id = %id,
            owner = ?owner,
            "subscribed"
        );
        id
    }

    fn delivery_failed(
        &self,
        tag: &EventTag,
        subscriber_id: SubscriberId,
        err: DispatchError,
    ) -> BroadcastError {
        match err {
            DispatchError::Handler(source) => {
                warn!(
                    broadcaster = %self.name,
                    %tag,
                    %subscriber_id,
                    error = %source,
                    "handler failed; broadcast stopped"
                );
                BroadcastError::HandlerFailed {
                    tag: tag.clone(),
                    subscriber_id,
                    source,
                }
            }
            other => {
                error!(
                    broadcaster = %self.name,
                    %tag,
                    %subscriber_id,
                    error = %other,
                    "dispatcher failed; broadcast stopped"
                );
                BroadcastError::Dispatcher {
                    tag: tag.clone(),
                    subscriber_id,
                    source: other,
                }
            }
        }
    }
}

impl<E: Event> Default for Broadcaster<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for Broadcaster<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags = self.topics.read().map(|t| t.len()).unwrap_or_default();
        f.debug_struct("Broadcaster")
            .field("name", &self.name)
            .field("dispatcher", &self.dispatcher)
            .field("tags", &tags)
            .finish()
    }
}

impl<E: Event> EventBroadcasting<E> for Broadcaster<E> {
    fn subscribe<F>(&self, tag: impl Into<EventTag>, handler: F) -> SubscriberId
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(None, tag.into(), Arc::new(handler))
    }

    fn subscribe_owned<F>(&self, owner: OwnerKey, tag: impl Into<EventTag>, handler: F)
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Some(owner), tag.into(), Arc::new(handler));
    }

    fn unsubscribe(&self, id: SubscriberId, tag: impl AsRef<str>) -> bool {
        let tag = tag.as_ref();
        let Some(topic) = self.topic(tag) else {
            return false;
        };
        let mut topic = lock(&topic);

        let removed = topic.subscribers.remove(id);
        if removed {
            topic.owners.forget(id);
        }

        debug!(broadcaster = %self.name, %tag, subscriber_id = %id, removed, "unsubscribed");
        removed
    }

    fn unsubscribe_owner(&self, owner: &OwnerKey, tag: impl AsRef<str>) -> bool {
        let tag = tag.as_ref();
        let Some(topic) = self.topic(tag) else {
            return false;
        };
        let mut topic = lock(&topic);
        let Some(ids) = topic.owners.remove(owner) else {
            return false;
        };

        let mut all_removed = true;
        for id in &ids {
            all_removed &= topic.subscribers.remove(*id);
            // Another owner may list the same id; it no longer exists for them either.
            topic.owners.forget(*id);
        }

        if all_removed {
            debug!(broadcaster = %self.name, %tag, %owner, count = ids.len(), "owner unsubscribed");
        } else {
            // Unreachable while `unsubscribe` keeps the owner index in sync; guards against drift.
            error!(
                broadcaster = %self.name,
                %tag,
                %owner,
                "owner index referenced subscribers missing from the table"
            );
        }
        all_removed
    }

    fn broadcast(&self, event: impl Into<Arc<E>>) -> Result<(), BroadcastError> {
        let event: Arc<E> = event.into();
        let tag = event.tag();

        let Some(topic) = self.topic(tag.as_str()) else {
            trace!(broadcaster = %self.name, %tag, "no subscribers");
            return Ok(());
        };
        let snapshot = lock(&topic).subscribers.clone();

        trace!(broadcaster = %self.name, %tag, subscribers = snapshot.len(), "broadcasting");
        snapshot.try_for_each(|subscriber_id, handler| {
            let handler = Arc::clone(handler);
            let event = Arc::clone(&event);
            let delivery = Delivery::new(tag.clone(), subscriber_id, move || handler(&*event));

            self.dispatcher
                .dispatch(delivery)
                .map_err(|err| self.delivery_failed(&tag, subscriber_id, err))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Registry locks never guard user code, so a poisoned lock still holds consistent data.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
