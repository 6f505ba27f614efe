//! Strongly-typed identifiers used by the subscription registry.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Handle for one registered handler.
///
/// Unique only within a single event tag: every tag starts counting at zero,
/// ids grow monotonically and are never handed out twice for the same tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id that follows this one in allocation order.
    pub const fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl core::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for SubscriberId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SubscriberId> for u64 {
    fn from(value: SubscriberId) -> Self {
        value.0
    }
}

/// Caller-chosen identity used to manage a batch of subscriptions together.
///
/// Owner keys are constructed deliberately; the bus never derives them from
/// handler values. Every subscription registered under the same key for a
/// tag is removed by a single owner-based unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerKey(Uuid);

impl OwnerKey {
    /// Create a fresh owner key.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer `from_u64` in tests for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Stable key derived from an integer id (e.g. a component number).
    pub fn from_u64(value: u64) -> Self {
        Self(Uuid::from_u64_pair(0, value))
    }

    /// Key derived from the address of a live object.
    ///
    /// Two calls with the same object yield the same key. Addresses are
    /// reused after deallocation, so unsubscribe before the object is dropped.
    /// Values of a zero-sized type all share one address and therefore one
    /// key; give such owners an explicit key (`new` or `from_u64`) instead.
    pub fn of<T: ?Sized>(object: &T) -> Self {
        let addr = (object as *const T).cast::<()>() as usize as u64;
        Self(Uuid::from_u64_pair(u64::MAX, addr))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerKey {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for OwnerKey {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<OwnerKey> for Uuid {
    fn from(value: OwnerKey) -> Self {
        value.0
    }
}

impl FromStr for OwnerKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| CoreError::invalid_id(format!("OwnerKey: {}", e)))?;
        Ok(Self(uuid))
    }
}
