//! Error types for dispatch and broadcast.

use thiserror::Error;

use herald_core::SubscriberId;

use crate::event::EventTag;

/// What a handler returns. `Err` aborts the rest of the broadcast pass.
pub type HandlerResult = anyhow::Result<()>;

/// Failure reported by an [`EventDispatcher`](crate::EventDispatcher).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The handler ran and failed (a returned error or a caught panic).
    #[error("handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    /// The execution context backing the dispatcher is gone.
    #[error("dispatcher is closed")]
    Closed,

    /// A worker thread for the dispatcher could not be started.
    #[error("failed to start dispatch worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Failure surfaced to the caller of `broadcast`.
///
/// Handlers invoked before the failing one are not rolled back; handlers after
/// it were not invoked.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("subscriber {subscriber_id} of `{tag}` failed: {source}")]
    HandlerFailed {
        tag: EventTag,
        subscriber_id: SubscriberId,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not deliver `{tag}` to subscriber {subscriber_id}: {source}")]
    Dispatcher {
        tag: EventTag,
        subscriber_id: SubscriberId,
        #[source]
        source: DispatchError,
    },
}

impl BroadcastError {
    pub fn tag(&self) -> &EventTag {
        match self {
            Self::HandlerFailed { tag, .. } | Self::Dispatcher { tag, .. } => tag,
        }
    }

    /// The subscriber whose delivery ended the pass.
    pub fn subscriber_id(&self) -> SubscriberId {
        match self {
            Self::HandlerFailed { subscriber_id, .. } | Self::Dispatcher { subscriber_id, .. } => {
                *subscriber_id
            }
        }
    }
}
