//! Usage accountant: merges every model response's token usage into the
//! session counters.
//!
//! The accountant is the only writer of [`SharedUsage`]. Providers report
//! usage per response; the accountant turns each report into a delta and
//! adds it, so counters never go down. A response without a usage report
//! contributes nothing.

use async_trait::async_trait;
use chrono::Utc;
use persanna_core::error::ProviderError;
use persanna_core::event::{DomainEvent, EventBus};
use persanna_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
use persanna_core::session::{SharedUsage, UsageCounters};
use std::sync::Arc;
use tracing::debug;

pub struct UsageAccountant {
    usage: SharedUsage,
    event_bus: Option<Arc<EventBus>>,
}

impl UsageAccountant {
    pub fn new(usage: SharedUsage) -> Self {
        Self {
            usage,
            event_bus: None,
        }
    }

    /// Publish a `UsageRecorded` event for every non-empty delta.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Record one response's usage and return the delta that was applied.
    pub fn record(&self, model: &str, usage: Option<&Usage>) -> UsageCounters {
        let delta = usage.map(UsageCounters::from_usage).unwrap_or_default();
        if delta.is_zero() {
            debug!(model, "Response carried no token usage");
            return delta;
        }

        let totals = self.usage.accumulate(&delta);
        debug!(
            model,
            prompt_tokens = delta.prompt_tokens,
            completion_tokens = delta.completion_tokens,
            total_tokens = totals.total_tokens,
            "Recorded token usage"
        );

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::UsageRecorded {
                model: model.to_string(),
                prompt_tokens: saturate(delta.prompt_tokens),
                completion_tokens: saturate(delta.completion_tokens),
                total_tokens: saturate(delta.total_tokens),
                timestamp: Utc::now(),
            });
        }
        delta
    }

    /// Current session totals.
    pub fn totals(&self) -> UsageCounters {
        self.usage.snapshot()
    }
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// A provider decorator that reports every completion to an accountant.
///
/// Handed to tools that call the model themselves, so their usage lands in
/// the same session counters as the reasoning loop's own calls.
pub struct MeteredProvider {
    inner: Arc<dyn Provider>,
    accountant: Arc<UsageAccountant>,
}

impl MeteredProvider {
    pub fn new(inner: Arc<dyn Provider>, accountant: Arc<UsageAccountant>) -> Self {
        Self { inner, accountant }
    }
}

#[async_trait]
impl Provider for MeteredProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let response = self.inner.complete(request).await?;
        self.accountant
            .record(&response.model, response.usage.as_ref());
        Ok(response)
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.inner.embed(request).await
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
