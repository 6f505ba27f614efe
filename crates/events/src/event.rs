use std::borrow::{Borrow, Cow};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier naming an event kind (e.g. `"Connection:closed"`).
///
/// Tags compare by value and key the subscription registry. Static tags are
/// free to construct; dynamic ones own their string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTag(Cow<'static, str>);

impl EventTag {
    /// Tag backed by a string literal.
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    /// Tag namespaced by the declaring type: `"<TypeName>:<name>"`.
    ///
    /// The type name is unqualified and stripped of generic arguments, so
    /// `EventTag::scoped::<Connection>("closed")` is `"Connection:closed"`.
    /// Purely a naming convention; the registry never checks it.
    pub fn scoped<T: ?Sized>(name: &str) -> Self {
        Self::new(format!("{}:{}", short_type_name::<T>(), name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EventTag {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for EventTag {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for EventTag {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for EventTag {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// An event routed by the broadcaster.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **opaque** to the bus, which only reads the tag
/// - shared across threads for the duration of one broadcast
///
/// Implement this on an enum with one variant per use case, or use
/// [`TaggedEvent`](crate::TaggedEvent) for a plain tag + payload pair.
pub trait Event: Send + Sync + 'static {
    /// Tag selecting which subscribers receive this event.
    fn tag(&self) -> EventTag;
}
