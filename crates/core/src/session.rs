//! Session state: the host's conversation state, passed explicitly into a turn.
//!
//! A session is **not** safe to drive from two turns at once: both would
//! snapshot the same history and race on the usage counters. The turn
//! controller takes `&mut SessionState`, so sharing a session between tasks
//! requires the host to put it behind its own lock.

use crate::message::StoredMessage;
use crate::provider::Usage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Cumulative token counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl UsageCounters {
    /// Turn a provider usage report into a delta.
    ///
    /// The total is the reported one, or prompt + completion when the
    /// backend reports zero.
    pub fn from_usage(usage: &Usage) -> Self {
        let prompt = u64::from(usage.prompt_tokens);
        let completion = u64::from(usage.completion_tokens);
        let total = match usage.total_tokens {
            0 => prompt + completion,
            reported => u64::from(reported),
        };
        Self {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: total,
        }
    }

    /// Additive merge. Counters never decrease.
    pub fn accumulate(&mut self, delta: &UsageCounters) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(delta.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(delta.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(delta.total_tokens);
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Session-scoped usage counters shared between the host and the accountant.
#[derive(Debug, Clone, Default)]
pub struct SharedUsage(Arc<RwLock<UsageCounters>>);

impl SharedUsage {
    pub fn new(initial: UsageCounters) -> Self {
        Self(Arc::new(RwLock::new(initial)))
    }

    /// Current counter values.
    pub fn snapshot(&self) -> UsageCounters {
        *self.0.read().unwrap_or_else(|poisoned| {
            warn!("Usage counters lock poisoned; reading last written values");
            poisoned.into_inner()
        })
    }

    /// Merge a delta and return the updated counters.
    pub fn accumulate(&self, delta: &UsageCounters) -> UsageCounters {
        let mut counters = self.0.write().unwrap_or_else(|poisoned| {
            warn!("Usage counters lock poisoned; accumulating onto last written values");
            poisoned.into_inner()
        });
        counters.accumulate(delta);
        *counters
    }
}

impl Serialize for SharedUsage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SharedUsage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        UsageCounters::deserialize(deserializer).map(Self::new)
    }
}

/// The host's conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Durable message log (source of truth for the memory window)
    #[serde(default)]
    pub messages: Vec<StoredMessage>,

    /// Selected model name
    pub model: String,

    /// URL of the active browser tab, if the host knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tab: Option<String>,

    /// Per-turn iteration cap; `None` or 0 means the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    /// Per-turn timeout in seconds; `None` or 0 means the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Cumulative token usage
    #[serde(default)]
    pub usage: SharedUsage,
}

impl SessionState {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            model: model.into(),
            active_tab: None,
            max_iterations: None,
            timeout_secs: None,
            usage: SharedUsage::default(),
        }
    }

    pub fn with_active_tab(mut self, url: impl Into<String>) -> Self {
        self.active_tab = Some(url.into());
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Iteration cap for the next turn, falling back to `default` for 0/unset.
    pub fn effective_max_iterations(&self, default: u32) -> u32 {
        match self.max_iterations {
            Some(n) if n > 0 => n,
            _ => default,
        }
    }

    /// Timeout for the next turn, falling back to `default` for 0/unset.
    pub fn effective_timeout_secs(&self, default: u64) -> u64 {
        match self.timeout_secs {
            Some(n) if n > 0 => n,
            _ => default,
        }
    }
}
