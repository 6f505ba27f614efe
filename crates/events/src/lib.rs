//! `herald-events`: in-process publish/subscribe.
//!
//! Producers broadcast events; consumers register handlers keyed by
//! [`EventTag`] and are called back synchronously, in subscription order.
//!
//! ```text
//! subscribe ──► Broadcaster ──► Topic(tag) { SubscriberTable, OwnerIndex }
//!
//! broadcast(event)
//!   └─► snapshot Topic(event.tag()).SubscriberTable
//!         └─► for each handler (ascending id):
//!               EventDispatcher::dispatch(Delivery) ──► handler(&event)
//!               └─ first failure stops the pass → BroadcastError
//! ```

pub mod broadcaster;
pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod event;
pub mod owners;
pub mod queue;
pub mod subscribers;

pub use broadcaster::Broadcaster;
pub use bus::{EventBroadcasting, EventHandler};
pub use config::{BroadcasterConfig, DispatcherKind};
pub use dispatcher::{Delivery, EventDispatcher, InlineDispatcher, MutedDispatcher};
pub use envelope::TaggedEvent;
pub use error::{BroadcastError, DispatchError, HandlerResult};
pub use event::{Event, EventTag};
pub use owners::OwnerIndex;
pub use queue::{KeyedQueueDispatcher, QueueDispatcher, QueueDispatcherConfig};
pub use subscribers::SubscriberTable;

pub use herald_core::{OwnerKey, SubscriberId};
