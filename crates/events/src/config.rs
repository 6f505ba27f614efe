//! Broadcaster configuration.

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use herald_core::{CoreError, CoreResult};

use crate::dispatcher::{EventDispatcher, InlineDispatcher, MutedDispatcher};
use crate::queue::{KeyedQueueDispatcher, QueueDispatcher};

/// Environment variable selecting the dispatcher (see [`DispatcherKind`]).
pub const DISPATCHER_ENV: &str = "HERALD_DISPATCHER";
/// Environment variable naming the broadcaster in logs.
pub const BROADCASTER_NAME_ENV: &str = "HERALD_BROADCASTER_NAME";

const DEFAULT_NAME: &str = "broadcaster";

/// Built-in dispatching policies, selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatcherKind {
    /// Run handlers on the broadcasting thread.
    Inline,
    /// Shared process-wide serial queue.
    #[default]
    Queue,
    /// One serial queue per event tag.
    KeyedQueue,
    /// Never run handlers.
    Muted,
}

impl DispatcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Queue => "queue",
            Self::KeyedQueue => "keyed-queue",
            Self::Muted => "muted",
        }
    }

    /// Instantiate the dispatcher. `Queue` resolves to [`QueueDispatcher::shared`].
    pub fn build(&self) -> Arc<dyn EventDispatcher> {
        match self {
            Self::Inline => Arc::new(InlineDispatcher),
            Self::Queue => QueueDispatcher::shared(),
            Self::KeyedQueue => Arc::new(KeyedQueueDispatcher::new()),
            Self::Muted => Arc::new(MutedDispatcher),
        }
    }
}

impl FromStr for DispatcherKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "queue" => Ok(Self::Queue),
            "keyed-queue" => Ok(Self::KeyedQueue),
            "muted" => Ok(Self::Muted),
            other => Err(CoreError::invalid_config(format!(
                "unknown dispatcher `{}` (expected inline, queue, keyed-queue or muted)",
                other
            ))),
        }
    }
}

/// Broadcaster configuration.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Name for logging
    pub name: String,
    /// Strategy every handler invocation goes through
    pub dispatcher: Arc<dyn EventDispatcher>,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            dispatcher: QueueDispatcher::shared(),
        }
    }
}

impl BroadcasterConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Read `HERALD_DISPATCHER` and `HERALD_BROADCASTER_NAME`.
    ///
    /// Unset variables fall back to the defaults; unparsable ones are an error.
    pub fn from_env() -> CoreResult<Self> {
        let dispatcher = read_env(DISPATCHER_ENV)?;
        let name = read_env(BROADCASTER_NAME_ENV)?;
        Self::from_values(dispatcher.as_deref(), name)
    }

    fn from_values(dispatcher: Option<&str>, name: Option<String>) -> CoreResult<Self> {
        let kind = dispatcher
            .map(DispatcherKind::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            name: name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            dispatcher: kind.build(),
        })
    }
}

fn read_env(key: &str) -> CoreResult<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(CoreError::invalid_config(format!(
            "{} is not valid unicode",
            key
        ))),
    }
}
