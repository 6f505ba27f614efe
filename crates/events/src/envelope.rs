use serde::{Deserialize, Serialize};

use crate::event::{Event, EventTag};

/// Ready-made event carrying a tag and an opaque payload.
///
/// The payload is never inspected by the bus; subscribers read it through
/// [`TaggedEvent::payload`]. Use `P = ()` for events that only signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedEvent<P> {
    tag: EventTag,
    payload: P,
}

impl<P> TaggedEvent<P> {
    pub fn new(tag: impl Into<EventTag>, payload: P) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    pub fn tag(&self) -> &EventTag {
        &self.tag
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl TaggedEvent<()> {
    /// Event without payload.
    pub fn bare(tag: impl Into<EventTag>) -> Self {
        Self::new(tag, ())
    }
}

impl<P> Event for TaggedEvent<P>
where
    P: Send + Sync + 'static,
{
    fn tag(&self) -> EventTag {
        self.tag.clone()
    }
}
